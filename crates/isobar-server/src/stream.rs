//! Stream identity and bookkeeping, for log correlation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a discovery stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(u64);

impl StreamId {
    /// Generate a new unique stream ID.
    #[must_use]
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for StreamId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stream-{}", self.0)
    }
}

/// Counters for one active stream.
#[derive(Debug)]
pub struct StreamContext {
    id: StreamId,
    requests: AtomicU64,
    responses: AtomicU64,
}

impl StreamContext {
    /// Create a context with a fresh stream ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: StreamId::new(),
            requests: AtomicU64::new(0),
            responses: AtomicU64::new(0),
        }
    }

    /// The stream's ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Record an inbound request.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an outbound response.
    pub fn record_response(&self) {
        self.responses.fetch_add(1, Ordering::Relaxed);
    }

    /// Total inbound requests.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Total outbound responses.
    #[must_use]
    pub fn response_count(&self) -> u64 {
        self.responses.load(Ordering::Relaxed)
    }
}

impl Default for StreamContext {
    fn default() -> Self {
        Self::new()
    }
}
