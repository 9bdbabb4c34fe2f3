//! Bulk import of per-category GeoJSON files into the catalog store.
//!
//! Each `<category>.geojson` file under the data directory holds one
//! category's features; `all.geojson` is the aggregate view and is skipped
//! so its contents are not imported twice. Duplicate-coordinate rejections
//! are counted, not failed: re-running the import is safe.

use crate::error::{CatalogError, Result};
use crate::geojson::FeatureCollection;
use crate::storage::CatalogStore;
use crate::taxonomy::{Taxonomy, AGGREGATE_CATEGORY};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub files: usize,
    pub imported: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

pub async fn import_geojson_dir(
    store: &dyn CatalogStore,
    taxonomy: &Taxonomy,
    data_dir: &Path,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    let mut paths: Vec<_> = fs::read_dir(data_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map_or(false, |ext| ext == "geojson"))
        .collect();
    paths.sort();

    for path in paths {
        let category_id = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };
        if category_id == AGGREGATE_CATEGORY {
            info!("skipping aggregate file {}", path.display());
            continue;
        }
        if !taxonomy.is_storable_category(&category_id) {
            warn!("skipping file for unknown category: {}", path.display());
            continue;
        }

        let content = fs::read_to_string(&path)?;
        let collection: FeatureCollection = serde_json::from_str(&content)?;
        summary.files += 1;

        for feature in &collection.features {
            let Some(new_venue) = feature.to_new_venue(&category_id, &taxonomy.cities) else {
                warn!(
                    "skipping feature without city or coordinates: {}",
                    feature.properties.name
                );
                summary.skipped += 1;
                continue;
            };

            // A feature may override the file's category; the override
            // must still be a real, storable category.
            if !taxonomy.is_storable_category(&new_venue.category_id) {
                warn!(
                    "skipping feature with unstorable category \"{}\": {}",
                    new_venue.category_id, feature.properties.name
                );
                summary.skipped += 1;
                continue;
            }

            match store.create(new_venue).await {
                Ok(_) => summary.imported += 1,
                Err(CatalogError::DuplicateCoordinates { .. }) => summary.duplicates += 1,
                Err(e) => return Err(e),
            }
        }

        info!(
            "imported {} ({} features)",
            path.display(),
            collection.features.len()
        );
    }

    Ok(summary)
}
