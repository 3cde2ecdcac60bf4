//! Server configuration.

/// Configuration for the discovery server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Outbound queue depth per stream. A stream whose client falls this
    /// many responses behind is closed with a resource-exhausted status.
    pub stream_queue: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { stream_queue: 16 }
    }
}
