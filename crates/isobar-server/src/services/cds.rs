//! Cluster Discovery Service (CDS).

use std::sync::Arc;

use isobar_cache::ClusterCache;
use isobar_types::{type_url, Resource};
use tokio::sync::watch;

use crate::discovery::{DiscoverySource, SourceSnapshot};

/// Serves the cluster cache.
#[derive(Debug, Clone)]
pub struct ClusterSource {
    cache: Arc<ClusterCache>,
}

impl ClusterSource {
    /// Create a source over the cluster cache.
    pub fn new(cache: Arc<ClusterCache>) -> Self {
        Self { cache }
    }
}

impl DiscoverySource for ClusterSource {
    const TYPE_URL: &'static str = type_url::CLUSTER;
    const SERVICE_NAME: &'static str = "envoy.api.v2.ClusterDiscoveryService";
    const STREAM_METHOD: &'static str = "StreamClusters";
    const FETCH_METHOD: &'static str = "FetchClusters";

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
