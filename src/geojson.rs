//! GeoJSON point-feature exchange format.
//!
//! This is the wire format the UI and migration tooling exchange. Each
//! feature carries the composite display name (`"<city> <name>"`) and a
//! `[longitude, latitude, altitude]` point, altitude defaulting to 0.0.

use crate::domain::{derive_city_prefix, NewVenue, VenueRecord};
use crate::taxonomy::City;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: FeatureProperties,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "Name")]
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(rename = "categoryId", default)]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude, altitude]`, GeoJSON axis order.
    pub coordinates: Vec<f64>,
}

impl Feature {
    pub fn from_record(record: &VenueRecord) -> Self {
        Self {
            id: Some(record.id.to_string()),
            kind: "Feature".to_string(),
            properties: FeatureProperties {
                id: Some(record.id.to_string()),
                name: record.display_name(),
                description: record.description.clone(),
                image_url: record.image_url.clone(),
                category_id: Some(record.category_id.clone()),
            },
            geometry: Geometry {
                kind: "Point".to_string(),
                coordinates: vec![record.longitude, record.latitude, record.altitude],
            },
        }
    }

    pub fn longitude(&self) -> Option<f64> {
        self.geometry.coordinates.first().copied()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.geometry.coordinates.get(1).copied()
    }

    /// Converts an imported feature into creation arguments, resolving the
    /// city from the composite display name and stripping a leading city
    /// token from it. Features without resolvable coordinates or city are
    /// not importable.
    pub fn to_new_venue(&self, category_id: &str, cities: &[City]) -> Option<NewVenue> {
        let longitude = self.longitude()?;
        let latitude = self.latitude()?;
        let city_id = derive_city_prefix(&self.properties.name, cities)?;

        let name = self
            .properties
            .name
            .strip_prefix(&format!("{} ", city_id))
            .unwrap_or(&self.properties.name)
            .to_string();

        Some(NewVenue {
            name,
            description: self.properties.description.clone(),
            image_url: self.properties.image_url.clone(),
            latitude,
            longitude,
            category_id: self
                .properties
                .category_id
                .clone()
                .unwrap_or_else(|| category_id.to_string()),
            city_id,
        })
    }
}

impl FeatureCollection {
    pub fn from_records(name: &str, records: &[VenueRecord]) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            name: name.to_string(),
            features: records.iter().map(Feature::from_record).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Taxonomy;
    use chrono::Utc;
    use uuid::Uuid;

    fn record() -> VenueRecord {
        VenueRecord {
            id: Uuid::new_v4(),
            name: "Caffe".to_string(),
            description: Some("кофейня".to_string()),
            image_url: None,
            category_id: "Бар".to_string(),
            city_id: "BG".to_string(),
            latitude: 44.8142752,
            longitude: 20.4588704,
            altitude: 0.0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn feature_uses_wire_field_names_and_axis_order() {
        let feature = Feature::from_record(&record());
        let json = serde_json::to_value(&feature).unwrap();

        assert_eq!(json["type"], "Feature");
        assert_eq!(json["properties"]["Name"], "BG Caffe");
        assert_eq!(json["properties"]["categoryId"], "Бар");
        assert!(json["properties"]["imageUrl"].is_null());
        assert_eq!(json["geometry"]["type"], "Point");
        // longitude first, then latitude, then altitude
        assert_eq!(json["geometry"]["coordinates"][0], 20.4588704);
        assert_eq!(json["geometry"]["coordinates"][1], 44.8142752);
        assert_eq!(json["geometry"]["coordinates"][2], 0.0);
    }

    #[test]
    fn imported_feature_resolves_city_and_strips_prefix() {
        let cities = Taxonomy::builtin().cities;
        let feature = Feature::from_record(&record());
        let new_venue = feature.to_new_venue("Бар", &cities).unwrap();

        assert_eq!(new_venue.city_id, "BG");
        assert_eq!(new_venue.name, "Caffe");
        assert_eq!(new_venue.latitude, 44.8142752);
        assert_eq!(new_venue.longitude, 20.4588704);
    }

    #[test]
    fn feature_without_known_city_is_not_importable() {
        let cities = Taxonomy::builtin().cities;
        let mut feature = Feature::from_record(&record());
        feature.properties.name = "Nowhere Caffe".to_string();
        assert!(feature.to_new_venue("Бар", &cities).is_none());
    }

    #[test]
    fn altitude_defaults_to_zero_when_missing() {
        let json = r#"{
            "type": "Feature",
            "properties": { "Name": "BG Caffe", "description": null },
            "geometry": { "type": "Point", "coordinates": [20.45, 44.81] }
        }"#;
        let feature: Feature = serde_json::from_str(json).unwrap();
        assert_eq!(feature.longitude(), Some(20.45));
        assert_eq!(feature.latitude(), Some(44.81));
        assert_eq!(feature.geometry.coordinates.get(2), None);
    }
}
