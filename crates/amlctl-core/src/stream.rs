// ── Reactive state streams ──
//
// Subscription handle shared by resource slices, the session and the
// analytics panel.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A subscription to a state container.
///
/// Offers the snapshot captured at creation, the latest snapshot, and
/// change notification via [`changed()`](Self::changed) or a `Stream`.
pub struct StateStream<S: Send + Sync + 'static> {
    current: Arc<S>,
    receiver: watch::Receiver<Arc<S>>,
}

impl<S: Send + Sync + 'static> StateStream<S> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<S>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot as of creation or the last `changed()`.
    pub fn current(&self) -> &Arc<S> {
        &self.current
    }

    pub fn latest(&self) -> Arc<S> {
        self.receiver.borrow().clone()
    }

    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next change. `None` once the container is dropped.
    pub async fn changed(&mut self) -> Option<Arc<S>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    pub fn into_stream(self) -> StateWatchStream<S> {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding each new snapshot.
pub struct StateWatchStream<S: Send + Sync + 'static> {
    inner: WatchStream<Arc<S>>,
}

impl<S: Send + Sync + 'static> Stream for StateWatchStream<S> {
    type Item = Arc<S>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
