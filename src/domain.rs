//! Core data shapes shared across layers.

use crate::taxonomy::City;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Two records closer than this on both axes are considered the same
/// location and the second insert is rejected.
pub const COORDINATE_TOLERANCE: f64 = 1e-4;

/// A single point-of-interest record. Immutable after creation except for
/// `image_url`, which a maintenance pass may backfill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: String,
    pub city_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub created_at: DateTime<Utc>,
}

impl VenueRecord {
    /// Composite display name, conventionally `"<city> <name>"`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.city_id, self.name)
    }
}

/// Arguments for creating a venue record. The store assigns the id and
/// timestamp and enforces the duplicate-coordinate invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVenue {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub category_id: String,
    pub city_id: String,
}

/// Whether two coordinate pairs fall within the duplicate tolerance on
/// both axes.
pub fn same_location(lat_a: f64, lng_a: f64, lat_b: f64, lng_b: f64) -> bool {
    (lat_a - lat_b).abs() < COORDINATE_TOLERANCE && (lng_a - lng_b).abs() < COORDINATE_TOLERANCE
}

/// Resolves which known city a display name belongs to, trying the
/// strategies in a fixed order:
/// 1. the first whitespace-delimited token is a known city id;
/// 2. the name carries a parenthesized city id, e.g. `"Caffe (BG)"`;
/// 3. the name contains a known city id anywhere.
pub fn derive_city_prefix(display_name: &str, cities: &[City]) -> Option<String> {
    let first = display_name.split_whitespace().next()?;
    if cities.iter().any(|c| c.id == first) {
        return Some(first.to_string());
    }
    for city in cities {
        if display_name.contains(&format!("({})", city.id)) {
            return Some(city.id.clone());
        }
    }
    for city in cities {
        if display_name.contains(&city.id) {
            return Some(city.id.clone());
        }
    }
    None
}
