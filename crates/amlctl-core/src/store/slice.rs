// ── Reactive slice container ──
//
// Holds a state snapshot behind a `watch` channel. Readers get a cheap
// `Arc` clone; writers go through `dispatch`, which runs the reducer in
// place and notifies subscribers only when something changed.

use std::sync::Arc;

use tokio::sync::watch;

use super::state::{ResourceAction, ResourceState, reduce};
use crate::model::Record;
use crate::stream::StateStream;

/// Process-wide container for one entity collection.
pub struct Slice<T: Record> {
    state: watch::Sender<Arc<ResourceState<T>>>,
}

impl<T: Record> Slice<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(ResourceState::default()));
        Self { state }
    }

    /// Run one reducer transition. Returns whether the state changed.
    pub fn dispatch(&self, action: ResourceAction<T>) -> bool {
        self.state
            .send_if_modified(|state| reduce(Arc::make_mut(state), action))
    }

    /// Start a list request and return its sequence number.
    pub fn begin_list(&self) -> u64 {
        let mut seq = 0;
        self.state.send_modify(|state| {
            let state = Arc::make_mut(state);
            reduce(state, ResourceAction::ListPending);
            seq = state.latest_list;
        });
        seq
    }

    /// Start a non-list operation and return the epoch its result belongs to.
    pub fn begin(&self) -> u64 {
        let mut epoch = 0;
        self.state.send_modify(|state| {
            let state = Arc::make_mut(state);
            reduce(state, ResourceAction::Pending);
            epoch = state.epoch;
        });
        epoch
    }

    /// Apply the result of an operation started in `epoch`. Dropped if the
    /// slice was reset in between.
    pub fn settle(&self, epoch: u64, action: ResourceAction<T>) -> bool {
        self.dispatch(ResourceAction::Scoped {
            epoch,
            action: Box::new(action),
        })
    }

    /// Current state (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<ResourceState<T>> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> StateStream<ResourceState<T>> {
        StateStream::new(self.state.subscribe())
    }
}

impl<T: Record> Default for Slice<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{EntityId, Device};

    fn device(id: &str) -> Arc<Device> {
        Arc::new(
            serde_json::from_value(serde_json::json!({"id": id, "name": "Laptop", "trusted": false}))
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn subscribers_see_each_change() {
        let slice = Slice::<Device>::new();
        let mut stream = slice.subscribe();
        assert!(stream.current().items.is_empty());

        slice.dispatch(ResourceAction::Created(device("D1")));
        let state = stream.changed().await.unwrap();
        assert_eq!(state.items.len(), 1);
    }

    #[test]
    fn no_op_transition_does_not_notify() {
        let slice = Slice::<Device>::new();
        let stream = slice.subscribe();
        assert!(!slice.dispatch(ResourceAction::ClearSelected));
        assert!(!stream.has_changed());
    }

    #[test]
    fn begin_list_issues_increasing_sequence() {
        let slice = Slice::<Device>::new();
        assert_eq!(slice.begin_list(), 1);
        assert_eq!(slice.begin_list(), 2);
        assert!(slice.snapshot().loading);
    }

    #[test]
    fn snapshots_are_isolated_from_later_dispatches() {
        let slice = Slice::<Device>::new();
        slice.dispatch(ResourceAction::Created(device("D1")));
        let before = slice.snapshot();
        slice.dispatch(ResourceAction::Removed(EntityId::from("D1")));
        assert_eq!(before.items.len(), 1);
        assert!(slice.snapshot().items.is_empty());
    }

    #[test]
    fn settle_after_reset_is_dropped() {
        let slice = Slice::<Device>::new();
        let epoch = slice.begin();
        slice.dispatch(ResourceAction::Reset);
        assert!(!slice.settle(epoch, ResourceAction::Created(device("D1"))));
        assert!(slice.snapshot().items.is_empty());

        let epoch = slice.begin();
        assert!(slice.settle(epoch, ResourceAction::Created(device("D2"))));
        assert_eq!(slice.snapshot().items.len(), 1);
    }
}
