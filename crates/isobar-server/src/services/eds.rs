//! Endpoint Discovery Service (EDS).

use std::sync::Arc;

use isobar_cache::EndpointCache;
use isobar_types::{type_url, Resource};
use tokio::sync::watch;

use crate::discovery::{DiscoverySource, SourceSnapshot};

/// Serves the endpoint-assignment cache.
#[derive(Debug, Clone)]
pub struct EndpointSource {
    cache: Arc<EndpointCache>,
}

impl EndpointSource {
    /// Create a source over the endpoint cache.
    pub fn new(cache: Arc<EndpointCache>) -> Self {
        Self { cache }
    }
}

impl DiscoverySource for EndpointSource {
    const TYPE_URL: &'static str = type_url::ENDPOINT;
    const SERVICE_NAME: &'static str = "envoy.api.v2.EndpointDiscoveryService";
    const STREAM_METHOD: &'static str = "StreamEndpoints";
    const FETCH_METHOD: &'static str = "FetchEndpoints";

    fn fetch(&self) -> SourceSnapshot {
        let (version, contents) = self.cache.snapshot();
        SourceSnapshot {
            version,
            resources: contents
                .into_iter()
                .map(|c| (c.name().to_string(), c.to_any()))
                .collect(),
        }
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.cache.subscribe()
    }
}
