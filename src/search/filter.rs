//! The filter pipeline: independent optional predicates combined with
//! logical AND, applied cheapest-first so the free-text scan only sees
//! records that already passed the cheaper checks.
//!
//! Category is deliberately not a predicate here: it is a partition key
//! resolved at index-lookup time (`SearchIndex::visible`).

use crate::domain::{derive_city_prefix, VenueRecord};
use crate::search::index::SearchableVenue;
use crate::taxonomy::City;
use std::sync::Arc;

/// The caller's current filter selection. Empty fields filter nothing; a
/// fully empty selection passes the input through unchanged.
#[derive(Debug, Clone, Default)]
pub struct FilterSelection {
    pub city: Option<String>,
    pub venue_type: Option<String>,
    pub query: String,
}

/// Narrows one partition to the records matching the selection. Output
/// keeps input order; records are shared, never copied or mutated. A
/// selection that matches nothing yields an empty vec, not an error.
pub fn apply(items: &[SearchableVenue], selection: &FilterSelection) -> Vec<Arc<VenueRecord>> {
    let mut kept: Vec<&SearchableVenue> = items.iter().collect();

    // City check is a handful of string probes per record.
    if let Some(city) = selection.city.as_deref() {
        kept.retain(|item| matches_city(item, city));
    }

    // Type check is a single equality.
    if let Some(venue_type) = selection.venue_type.as_deref() {
        kept.retain(|item| matches_type(item, venue_type));
    }

    // Free-text scan runs last, over whatever survived.
    let query = selection.query.trim().to_lowercase();
    if !query.is_empty() {
        kept.retain(|item| matches_query(item, &query));
    }

    kept.into_iter().map(|item| Arc::clone(&item.record)).collect()
}

/// Most permissive city policy: exact first-token equality on the display
/// name, OR the lower-cased name contains the token preceded by a space,
/// OR contains it parenthesized.
fn matches_city(item: &SearchableVenue, city: &str) -> bool {
    if item.record.city_id == city {
        return true;
    }
    let token = city.to_lowercase();
    item.name_lower.contains(&format!(" {}", token))
        || item.name_lower.contains(&format!("({})", token))
}

/// Venue "type" is the record's category id. Matching on description
/// keywords is a historical, non-deterministic policy and is not used.
fn matches_type(item: &SearchableVenue, venue_type: &str) -> bool {
    item.record.category_id == venue_type
}

/// Case-insensitive substring match against name or description. The same
/// test applies to short (<= 2 chars) and long queries.
fn matches_query(item: &SearchableVenue, query_lower: &str) -> bool {
    item.name_lower.contains(query_lower)
        || item
            .description_lower
            .as_deref()
            .map_or(false, |d| d.contains(query_lower))
}

/// Facet helper for the filter bar: category ids present in the partition
/// with their counts, in first-seen order.
pub fn type_counts(items: &[SearchableVenue]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        match counts
            .iter_mut()
            .find(|(id, _)| id == &item.record.category_id)
        {
            Some((_, n)) => *n += 1,
            None => counts.push((item.record.category_id.clone(), 1)),
        }
    }
    counts
}

/// Facet helper for the filter bar: known cities present in the partition
/// (derived from display names) with their counts, in first-seen order.
pub fn city_counts(items: &[SearchableVenue], cities: &[City]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        let Some(prefix) = derive_city_prefix(&item.record.display_name(), cities) else {
            continue;
        };
        match counts.iter_mut().find(|(id, _)| id == &prefix) {
            Some((_, n)) => *n += 1,
            None => counts.push((prefix, 1)),
        }
    }
    counts
}
