use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic source of request tokens.
///
/// A token is taken when a request for server state is *issued*. The state actor
/// applies a response only when its token is newer than the last one it applied,
/// so a slow response can never overwrite the result of a later request.
#[derive(Debug, Clone, Default)]
pub struct RequestSequence {
    next: Arc<AtomicU64>,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next token. The first token is 1; 0 means "nothing applied yet".
    pub fn next_token(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Result of offering a tokened write to a latest-wins state actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The write was older than what the state already shows.
    Discarded,
}
