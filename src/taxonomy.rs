//! Category and city lookup tables.
//!
//! Both sets are configuration data, shipped as TOML and loaded at startup,
//! so the taxonomy can change without a code change. The synthetic `"all"`
//! category is the union view over every real category; it is never stored
//! on a venue record.

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The aggregate category id: selects every category, never stored.
pub const AGGREGATE_CATEGORY: &str = "all";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub categories: Vec<Category>,
    pub cities: Vec<City>,
}

impl Taxonomy {
    /// The lookup tables compiled into the binary (config/taxonomy.toml).
    pub fn builtin() -> Self {
        toml::from_str(include_str!("../config/taxonomy.toml"))
            .expect("embedded taxonomy.toml is valid")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            CatalogError::Config(format!(
                "Failed to read taxonomy file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let taxonomy: Taxonomy = toml::from_str(&content)?;
        Ok(taxonomy)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Category info with a neutral fallback for ids the table does not
    /// know about, so rendering never fails on stale data.
    pub fn category_or_unknown(&self, id: &str) -> Category {
        self.category(id).cloned().unwrap_or_else(|| Category {
            id: id.to_string(),
            name: id.to_string(),
            icon: "🏠".to_string(),
            color: "bg-gray-500".to_string(),
        })
    }

    /// Categories a record may actually carry (everything but the aggregate).
    pub fn storable_categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(|c| c.id != AGGREGATE_CATEGORY)
    }

    pub fn is_storable_category(&self, id: &str) -> bool {
        id != AGGREGATE_CATEGORY && self.category(id).is_some()
    }

    pub fn city(&self, id: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.id == id)
    }

    pub fn is_known_city(&self, id: &str) -> bool {
        self.city(id).is_some()
    }
}
