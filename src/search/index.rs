//! Searchable projections of venue records.
//!
//! Free-text filtering runs on every keystroke, so the lower-cased text is
//! derived once per rebuild instead of once per comparison. Projections
//! share ownership of the original records; nothing is copied or mutated.

use crate::domain::VenueRecord;
use crate::search::filter::{self, FilterSelection};
use crate::taxonomy::AGGREGATE_CATEGORY;
use std::collections::HashMap;
use std::sync::Arc;

/// A venue record plus its pre-folded searchable text.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchableVenue {
    pub record: Arc<VenueRecord>,
    /// Lower-cased composite display name (`"<city> <name>"`).
    pub name_lower: String,
    pub description_lower: Option<String>,
}

impl SearchableVenue {
    fn project(record: Arc<VenueRecord>) -> Self {
        let name_lower = record.display_name().to_lowercase();
        let description_lower = record.description.as_ref().map(|d| d.to_lowercase());
        Self {
            record,
            name_lower,
            description_lower,
        }
    }
}

/// Per-category partitions of searchable projections, plus the aggregate
/// partition holding every record in input order.
#[derive(Debug, Default)]
pub struct SearchIndex {
    partitions: HashMap<String, Vec<SearchableVenue>>,
}

impl SearchIndex {
    /// Builds the index from the full record collection. Input order is
    /// preserved within every partition; rebuilding from the same input
    /// yields element-wise-equal projections.
    pub fn build(records: &[Arc<VenueRecord>]) -> Self {
        let mut partitions: HashMap<String, Vec<SearchableVenue>> = HashMap::new();

        for record in records {
            let projection = SearchableVenue::project(Arc::clone(record));
            partitions
                .entry(record.category_id.clone())
                .or_default()
                .push(projection.clone());
            partitions
                .entry(AGGREGATE_CATEGORY.to_string())
                .or_default()
                .push(projection);
        }

        Self { partitions }
    }

    /// The projections for one category; the aggregate id selects the
    /// union of every category. Unknown categories are empty, not an error.
    pub fn partition(&self, category_id: &str) -> &[SearchableVenue] {
        self.partitions
            .get(category_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The venue set visible under the caller's current filter selection.
    /// Category acts as a partition key; the remaining filters are applied
    /// as predicates by the filter pipeline.
    pub fn visible(&self, category_id: &str, selection: &FilterSelection) -> Vec<Arc<VenueRecord>> {
        filter::apply(self.partition(category_id), selection)
    }
}
