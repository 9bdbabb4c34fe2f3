//! Catalog store: the persistence boundary behind an injected trait.
//!
//! The store is opened once at process start and handed to callers as
//! `Arc<dyn CatalogStore>`; there is no hidden global connection. Creation
//! enforces the duplicate-coordinate invariant: an insert within 1e-4 of
//! an existing record on both axes is rejected with
//! `CatalogError::DuplicateCoordinates`, which callers treat as a normal
//! "report and move on" outcome.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::domain::{NewVenue, VenueRecord};
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every record, in stable insertion order.
    async fn list_all(&self) -> Result<Vec<VenueRecord>>;

    /// Records of one category, in stable insertion order. Unknown
    /// categories yield an empty list, not an error.
    async fn list_by_category(&self, category_id: &str) -> Result<Vec<VenueRecord>>;

    /// Creates a record, assigning id and timestamp. Fails with
    /// `DuplicateCoordinates` when another record already occupies the
    /// location within tolerance.
    async fn create(&self, venue: NewVenue) -> Result<VenueRecord>;

    /// Backfills the display image for one record (maintenance pass).
    /// Returns whether a record was updated.
    async fn update_image_url(&self, id: Uuid, image_url: &str) -> Result<bool>;
}
