use crate::domain::{same_location, NewVenue, VenueRecord};
use crate::error::{CatalogError, Result};
use crate::storage::CatalogStore;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// In-memory store implementation for development/testing. Keeps records
/// in a Vec so listing order is insertion order.
pub struct InMemoryStore {
    venues: Arc<Mutex<Vec<VenueRecord>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            venues: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_all(&self) -> Result<Vec<VenueRecord>> {
        let venues = self.venues.lock().unwrap();
        Ok(venues.clone())
    }

    async fn list_by_category(&self, category_id: &str) -> Result<Vec<VenueRecord>> {
        let venues = self.venues.lock().unwrap();
        Ok(venues
            .iter()
            .filter(|v| v.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn create(&self, venue: NewVenue) -> Result<VenueRecord> {
        let mut venues = self.venues.lock().unwrap();

        let duplicate = venues
            .iter()
            .any(|v| same_location(v.latitude, v.longitude, venue.latitude, venue.longitude));
        if duplicate {
            return Err(CatalogError::DuplicateCoordinates {
                longitude: venue.longitude,
                latitude: venue.latitude,
            });
        }

        let record = VenueRecord {
            id: Uuid::new_v4(),
            name: venue.name,
            description: venue.description,
            image_url: venue.image_url,
            category_id: venue.category_id,
            city_id: venue.city_id,
            latitude: venue.latitude,
            longitude: venue.longitude,
            altitude: 0.0,
            created_at: Utc::now(),
        };
        venues.push(record.clone());

        debug!("Created venue: {} with id {}", record.name, record.id);
        Ok(record)
    }

    async fn update_image_url(&self, id: Uuid, image_url: &str) -> Result<bool> {
        let mut venues = self.venues.lock().unwrap();
        if let Some(venue) = venues.iter_mut().find(|v| v.id == id) {
            venue.image_url = Some(image_url.to_string());
            debug!("Updated image for venue {}", id);
            return Ok(true);
        }
        Ok(false)
    }
}
