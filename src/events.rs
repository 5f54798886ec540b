//! Typed signals about the state of the user's session.
//!
//! The HTTP layer and [`SessionStore`](crate::SessionStore) publish these
//! instead of navigating directly. Whoever owns navigation subscribes and
//! decides what to do with them.

use reqwest::StatusCode;
use tokio::sync::broadcast;

/// How many events can be buffered before slow subscribers start missing
/// them.
const CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// A login or registration succeeded.
    SignedIn,
    /// The user logged out.
    SignedOut,
    /// The server rejected our credentials with a 401 or 403. The persisted
    /// session has already been cleared.
    Unauthenticated { status: StatusCode },
    /// A restored session was rejected when it was verified. The session
    /// has already been cleared.
    SessionExpired,
}

/// A cheaply cloneable handle for publishing [`AuthEvent`]s.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        AuthEvents { sender }
    }

    pub fn publish(&self, event: AuthEvent) {
        log::debug!("Publishing {:?}", event);

        // nobody listening is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }
}

impl Default for AuthEvents {
    fn default() -> Self { AuthEvents::new() }
}

/// Take every event currently waiting in `receiver` without blocking.
pub fn drain(receiver: &mut broadcast::Receiver<AuthEvent>) -> Vec<AuthEvent> {
    use broadcast::error::TryRecvError;

    let mut events = Vec::new();

    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(missed)) => {
                log::warn!("Missed {} auth events", missed);
            },
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }

    events
}
