//! In-memory filtering and search over the venue catalog.
//!
//! The index is rebuilt wholesale whenever the underlying records change;
//! it is never patched in place, so there are no partial-update states to
//! reason about. Filtering is synchronous, pure, and cheap enough to rerun
//! on every (debounced) keystroke.

pub mod filter;
pub mod index;

pub use filter::FilterSelection;
pub use index::{SearchIndex, SearchableVenue};
