//! Shared refresh bookkeeping.
//!
//! Every check-and-set happens under one mutex that is never held across an await, so the
//! "at most one refresh in flight" rule holds on a multi-threaded runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

use crate::error::ClientError;

/// What a waiter learns when the refresh it queued behind settles.
pub(crate) type RefreshOutcome = Result<(), Arc<ClientError>>;

/// How a request that hit a 401 has to proceed.
#[derive(Debug)]
pub(crate) enum Admission {
    /// The session is already known dead.
    FailFast,
    /// A refresh succeeded after the request was sent; replay it as is.
    Replay,
    /// Another request is refreshing; await the outcome, then replay.
    Wait(oneshot::Receiver<RefreshOutcome>),
    /// The caller owns the refresh and must settle it.
    Refresh,
}

#[derive(Debug, Default)]
struct Inner {
    /// Bumped by every successful refresh and every fresh login.
    epoch: u64,
    refreshing: bool,
    refresh_failed: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

#[derive(Debug, Default)]
pub(crate) struct RefreshState {
    inner: Mutex<Inner>,
}

impl RefreshState {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current session generation; capture it before sending a request.
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Decides what a request that was sent during `seen_epoch` and came back `401` does.
    pub fn admit(&self, seen_epoch: u64) -> Admission {
        let mut inner = self.lock();
        if inner.epoch != seen_epoch {
            return Admission::Replay;
        }
        if inner.refresh_failed {
            return Admission::FailFast;
        }
        if inner.refreshing {
            let (tx, rx) = oneshot::channel();
            inner.waiters.push(tx);
            return Admission::Wait(rx);
        }
        inner.refreshing = true;
        Admission::Refresh
    }

    /// Ends the in-flight refresh and wakes the waiters in enqueue order.
    /// Returns how many waiters were woken.
    pub fn settle(&self, outcome: RefreshOutcome) -> usize {
        let waiters = {
            let mut inner = self.lock();
            inner.refreshing = false;
            match &outcome {
                Ok(()) => inner.epoch += 1,
                Err(_) => inner.refresh_failed = true,
            }
            std::mem::take(&mut inner.waiters)
        };

        let woken = waiters.len();
        for waiter in waiters {
            // A waiter whose caller gave up has dropped its receiver.
            let _ = waiter.send(outcome.clone());
        }
        woken
    }

    /// Rolls back a refresh whose owner went away. Waiters see their channel close.
    pub fn abandon(&self) -> usize {
        let mut inner = self.lock();
        inner.refreshing = false;
        let dropped = inner.waiters.len();
        inner.waiters.clear();
        dropped
    }

    /// A request went through; a dead session is evidently alive again.
    pub fn note_success(&self) {
        let mut inner = self.lock();
        if inner.refresh_failed {
            inner.refresh_failed = false;
        }
    }

    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.refresh_failed = false;
        inner.epoch += 1;
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    pub fn is_refresh_failed(&self) -> bool {
        self.lock().refresh_failed
    }

    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }
}

/// Owns an [`Admission::Refresh`]. Dropping it unsettled (the refreshing future was
/// cancelled) abandons the refresh so queued requests are released.
pub(crate) struct RefreshGuard<'a> {
    state: &'a RefreshState,
    settled: bool,
}

impl<'a> RefreshGuard<'a> {
    pub fn new(state: &'a RefreshState) -> Self {
        Self {
            state,
            settled: false,
        }
    }

    pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
        self.settled = true;
        self.state.settle(outcome)
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let dropped = self.state.abandon();
            tracing::warn!(waiters = dropped, "session refresh abandoned before it settled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn unauthorized() -> Arc<ClientError> {
        Arc::new(ClientError::from_response_body(
            StatusCode::UNAUTHORIZED,
            String::new(),
        ))
    }

    #[test]
    fn first_admission_refreshes_and_later_ones_wait() {
        let state = RefreshState::default();

        assert!(matches!(state.admit(0), Admission::Refresh));
        assert!(state.is_refreshing());
        assert!(matches!(state.admit(0), Admission::Wait(_)));
        assert!(matches!(state.admit(0), Admission::Wait(_)));
        assert_eq!(state.waiting(), 2);
    }

    #[tokio::test]
    async fn success_wakes_every_waiter() {
        let state = RefreshState::default();
        let _owner = state.admit(0);
        let Admission::Wait(first) = state.admit(0) else {
            panic!("expected to wait");
        };
        let Admission::Wait(second) = state.admit(0) else {
            panic!("expected to wait");
        };

        assert_eq!(state.settle(Ok(())), 2);
        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
        assert!(!state.is_refreshing());
        assert!(!state.is_refresh_failed());
        assert!(matches!(state.admit(state.epoch()), Admission::Refresh));
    }

    #[test]
    fn rejection_from_before_a_refresh_is_replayed() {
        let state = RefreshState::default();
        let sent_at = state.epoch();

        assert!(matches!(state.admit(sent_at), Admission::Refresh));
        state.settle(Ok(()));

        assert!(matches!(state.admit(sent_at), Admission::Replay));
        assert!(!state.is_refreshing());
        assert_eq!(state.waiting(), 0);
    }

    #[test]
    fn failed_refresh_keeps_the_epoch() {
        let state = RefreshState::default();
        let sent_at = state.epoch();
        let _ = state.admit(sent_at);
        state.settle(Err(unauthorized()));

        assert_eq!(state.epoch(), sent_at);
        assert!(matches!(state.admit(sent_at), Admission::FailFast));
    }

    #[tokio::test]
    async fn failure_shares_one_error_and_fails_fast_afterwards() {
        let state = RefreshState::default();
        let _owner = state.admit(0);
        let Admission::Wait(waiter) = state.admit(0) else {
            panic!("expected to wait");
        };

        let err = unauthorized();
        state.settle(Err(err.clone()));

        let received = waiter.await.unwrap().unwrap_err();
        assert!(Arc::ptr_eq(&received, &err));
        assert!(state.is_refresh_failed());
        assert!(matches!(state.admit(0), Admission::FailFast));

        state.note_success();
        assert!(!state.is_refresh_failed());
        assert!(matches!(state.admit(0), Admission::Refresh));
    }

    #[tokio::test]
    async fn dropping_the_guard_releases_waiters() {
        let state = RefreshState::default();
        assert!(matches!(state.admit(0), Admission::Refresh));
        let guard = RefreshGuard::new(&state);
        let Admission::Wait(waiter) = state.admit(0) else {
            panic!("expected to wait");
        };

        drop(guard);

        assert!(waiter.await.is_err());
        assert!(!state.is_refreshing());
        assert!(!state.is_refresh_failed());
    }

    #[test]
    fn reset_clears_failure() {
        let state = RefreshState::default();
        let _ = state.admit(0);
        state.settle(Err(unauthorized()));
        state.reset();
        assert!(!state.is_refresh_failed());
        assert!(matches!(state.admit(0), Admission::Replay));
    }
}
