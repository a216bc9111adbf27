// ── Resource state and its reducer ──
//
// One `ResourceState<T>` per entity collection. Every change goes through
// `reduce`, which returns whether anything observable changed so the slice
// only notifies subscribers on real transitions.

use std::sync::Arc;

use amlctl_api::Page;

use super::filters::{FilterPatch, ListFilters, Pagination};
use crate::error::CoreError;
use crate::model::{EntityId, Record};

/// Canonical in-memory copy of one entity collection.
#[derive(Debug, Clone)]
pub struct ResourceState<T> {
    /// Records of the last applied list response, in server order.
    pub items: Vec<Arc<T>>,
    /// Detail-view focus. May outlive its record in `items`.
    pub selected: Option<Arc<T>>,
    pub loading: bool,
    pub error: Option<CoreError>,
    pub pagination: Pagination,
    pub filters: ListFilters,
    /// Sequence number of the newest list request issued.
    pub latest_list: u64,
    /// Bumped by every reset. Results of operations started in an older
    /// epoch are dropped.
    pub epoch: u64,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            loading: false,
            error: None,
            pagination: Pagination::default(),
            filters: ListFilters::default(),
            latest_list: 0,
            epoch: 0,
        }
    }
}

impl<T: Record> ResourceState<T> {
    pub fn get(&self, id: &EntityId) -> Option<&Arc<T>> {
        self.items.iter().find(|item| item.id() == id)
    }
}

/// Every transition a resource slice can make.
#[derive(Debug, Clone)]
pub enum ResourceAction<T> {
    /// A non-list operation started.
    Pending,
    /// A list request started. Issues the next sequence number.
    ListPending,
    /// List request `seq` resolved. Applied only if `seq` is still the newest.
    ListFulfilled { seq: u64, page: Page<T> },
    ListRejected { seq: u64, error: CoreError },
    /// Single-record fetch for the detail view.
    ItemFetched(Arc<T>),
    /// A mutation returned the new version of a record.
    ItemUpdated(Arc<T>),
    Created(Arc<T>),
    Removed(EntityId),
    /// An operation finished without a record to apply (exports, escalation).
    Settled,
    Rejected(CoreError),
    SetFilters(FilterPatch),
    Select(EntityId),
    ClearSelected,
    ClearError,
    /// Result of an operation started in `epoch`. Applied only if no
    /// reset happened since.
    Scoped {
        epoch: u64,
        action: Box<ResourceAction<T>>,
    },
    /// Back to the empty initial state (sign-out, expiry).
    Reset,
}

/// Apply `action` to `state`. Returns `true` if the state changed.
pub fn reduce<T: Record>(state: &mut ResourceState<T>, action: ResourceAction<T>) -> bool {
    match action {
        ResourceAction::Pending => {
            state.loading = true;
            state.error = None;
            true
        }
        ResourceAction::ListPending => {
            state.latest_list += 1;
            state.loading = true;
            state.error = None;
            true
        }
        ResourceAction::ListFulfilled { seq, page } => {
            if seq != state.latest_list {
                return false;
            }
            state.pagination = Pagination::from_page(&page, state.filters.page_size);
            state.items = page.results.into_iter().map(Arc::new).collect();
            state.loading = false;
            true
        }
        ResourceAction::ListRejected { seq, error } => {
            if seq != state.latest_list {
                return false;
            }
            state.loading = false;
            state.error = Some(error);
            true
        }
        ResourceAction::ItemFetched(record) => {
            state.loading = false;
            state.selected = Some(record);
            true
        }
        ResourceAction::ItemUpdated(record) => {
            state.loading = false;
            if let Some(slot) = state.items.iter_mut().find(|item| item.id() == record.id()) {
                *slot = Arc::clone(&record);
            }
            if state
                .selected
                .as_ref()
                .is_some_and(|selected| selected.id() == record.id())
            {
                state.selected = Some(record);
            }
            true
        }
        ResourceAction::Created(record) => {
            state.loading = false;
            state.items.insert(0, record);
            state.pagination.total += 1;
            true
        }
        ResourceAction::Removed(id) => {
            state.loading = false;
            let before = state.items.len();
            state.items.retain(|item| item.id() != &id);
            if state.items.len() < before {
                state.pagination.total = state.pagination.total.saturating_sub(1);
            }
            if state.selected.as_ref().is_some_and(|s| s.id() == &id) {
                state.selected = None;
            }
            true
        }
        ResourceAction::Settled => {
            let changed = state.loading;
            state.loading = false;
            changed
        }
        ResourceAction::Rejected(error) => {
            state.loading = false;
            state.error = Some(error);
            true
        }
        ResourceAction::SetFilters(patch) => {
            let before = state.filters.clone();
            state.filters.merge(patch);
            state.filters != before
        }
        ResourceAction::Select(id) => {
            let Some(record) = state.get(&id).cloned() else {
                return false;
            };
            state.selected = Some(record);
            true
        }
        ResourceAction::ClearSelected => state.selected.take().is_some(),
        ResourceAction::ClearError => state.error.take().is_some(),
        ResourceAction::Scoped { epoch, action } => {
            if epoch != state.epoch {
                return false;
            }
            reduce(state, *action)
        }
        ResourceAction::Reset => {
            // Advance both counters so anything requested before the reset lands as stale.
            *state = ResourceState {
                latest_list: state.latest_list + 1,
                epoch: state.epoch + 1,
                ..ResourceState::default()
            };
            true
        }
    }
}
