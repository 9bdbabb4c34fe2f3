//! Image backfill pass: resolves each record's display name to a candidate
//! image file and updates the record when one is found. The only mutation
//! the core ever applies to an existing record.

use crate::error::Result;
use crate::storage::CatalogStore;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::info;

// Extensions probed in order; first hit wins.
const IMAGE_EXTENSIONS: &[&str] = &["svg", "png", "jpg"];

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Display name to image file stem: drop everything but word characters,
/// whitespace and hyphens, collapse whitespace to hyphens, lower-case.
pub fn slugify(name: &str) -> String {
    let stripped = NON_SLUG_CHARS.replace_all(name, "");
    WHITESPACE.replace_all(stripped.trim(), "-").to_lowercase()
}

#[derive(Debug, Default)]
pub struct BackfillSummary {
    pub scanned: usize,
    pub updated: usize,
}

/// Looks for `<images_dir>/<slug>.<ext>` for every record and points the
/// record at `/images/venues/<slug>.<ext>` when the file exists and the
/// record does not already reference it.
pub async fn backfill_image_urls(
    store: &dyn CatalogStore,
    images_dir: &Path,
) -> Result<BackfillSummary> {
    let mut summary = BackfillSummary::default();

    for record in store.list_all().await? {
        summary.scanned += 1;

        let slug = slugify(&record.display_name());
        let found = IMAGE_EXTENSIONS.iter().find_map(|ext| {
            let file = format!("{}.{}", slug, ext);
            images_dir
                .join(&file)
                .exists()
                .then(|| format!("/images/venues/{}", file))
        });

        if let Some(image_url) = found {
            if record.image_url.as_deref() != Some(image_url.as_str())
                && store.update_image_url(record.id, &image_url).await?
            {
                info!("backfilled image for \"{}\"", record.display_name());
                summary.updated += 1;
            }
        }
    }

    Ok(summary)
}
