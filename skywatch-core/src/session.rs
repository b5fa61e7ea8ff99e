use parking_lot::Mutex;
use tokio::sync::watch;

use crate::model::SessionState;

/// Latest-request-wins state cell shared by the search and weather sessions.
///
/// Every request takes a sequence number from [`Sequenced::begin`]. Only a
/// completion carrying the highest number handed out so far may replace the
/// visible state; anything older is dropped. The counter and the state are
/// updated under one lock so an invalidation can never interleave with a
/// publish.
#[derive(Debug)]
pub(crate) struct Sequenced<T> {
    latest: Mutex<u64>,
    state: watch::Sender<SessionState<T>>,
}

impl<T: Clone> Sequenced<T> {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self { latest: Mutex::new(0), state }
    }

    /// Issue a new request: bump the sequence and show `Loading`.
    pub(crate) fn begin(&self) -> u64 {
        let mut latest = self.latest.lock();
        *latest += 1;
        self.state.send_replace(SessionState::Loading);
        *latest
    }

    /// Publish a completion. Returns `false` if `sequence` was superseded.
    pub(crate) fn publish(&self, sequence: u64, state: SessionState<T>) -> bool {
        let latest = self.latest.lock();
        if *latest != sequence {
            return false;
        }
        self.state.send_replace(state);
        true
    }

    /// Supersede everything in flight and show `state` instead.
    pub(crate) fn reset(&self, state: SessionState<T>) {
        let mut latest = self.latest.lock();
        *latest += 1;
        self.state.send_replace(state);
    }

    #[cfg(test)]
    pub(crate) fn latest(&self) -> u64 {
        *self.latest.lock()
    }

    pub(crate) fn snapshot(&self) -> SessionState<T> {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState<T>> {
        self.state.subscribe()
    }
}
