use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out monotonically increasing tickets so a store can tell whether a
/// response belongs to the most recent request of its kind.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

/// Identifies one request issued by a [`RequestSequence`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl RequestSequence {
    pub fn new() -> Self { RequestSequence::default() }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Has anything been issued since `ticket`?
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}
