//! Listener Discovery Service (LDS).

use std::sync::Arc;

use isobar_cache::ListenerCache;
use isobar_types::{type_url, Resource};
use tokio::sync::watch;

use crate::discovery::{DiscoverySource, SourceSnapshot};

/// Serves the listener cache.
#[derive(Debug, Clone)]
pub struct ListenerSource {
    cache: Arc<ListenerCache>,
}

impl ListenerSource {
    /// Create a source over the listener cache.
    pub fn new(cache: Arc<ListenerCache>) -> Self {
        Self { cache }
    }
}

impl DiscoverySource for ListenerSource {
    const TYPE_URL: &'static str = type_url::LISTENER;
    const SERVICE_NAME: &'static str = "envoy.api.v2.ListenerDiscoveryService";
    const STREAM_METHOD: &'static str = "StreamListeners";
    const FETCH_METHOD: &'static str = "FetchListeners";

    fn fetch(&self) -> SourceSnapshot {
        let (version, contents) = self.cache.snapshot();
        SourceSnapshot {
            version,
            resources: contents
                .into_iter()
                .map(|l| (l.name().to_string(), l.to_any()))
                .collect(),
        }
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.cache.subscribe()
    }
}
