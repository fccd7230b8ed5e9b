use tokio::sync::broadcast;
use tracing::trace;

const EVENT_CAPACITY: usize = 16;

/// Session lifecycle notifications published by the gateway and the auth API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
    /// The session could not be renewed; the user has to log in again.
    Expired,
}

/// Fan-out of [`SessionEvent`]s to every subscriber.
#[derive(Debug, Clone)]
pub(crate) struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }
}

impl SessionEvents {
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        if self.tx.send(event).is_err() {
            trace!(?event, "session event dropped, nobody is listening");
        }
    }
}
