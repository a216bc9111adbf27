// ── Client-side state store ──
//
// A generic resource slice replaces the per-entity reducer copies: every
// collection shares the same state shape, the same transitions and the
// same stale-response fencing.

mod filters;
mod slice;
mod state;

pub use filters::{DEFAULT_PAGE_SIZE, FilterPatch, ListFilters, Pagination};
pub use slice::Slice;
pub use state::{ResourceAction, ResourceState, reduce};
