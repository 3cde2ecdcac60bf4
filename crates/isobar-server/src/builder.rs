//! Server builder.

use std::sync::Arc;

use isobar_cache::{ClusterCache, EndpointCache, ListenerCache, VirtualHostCache};
use isobar_core::{Error, Result};

use crate::config::ServerConfig;
use crate::XdsServer;

/// Builder for an [`XdsServer`].
///
/// All four caches are required; they are usually the translator's.
#[derive(Debug, Default)]
pub struct XdsServerBuilder {
    clusters: Option<Arc<ClusterCache>>,
    endpoints: Option<Arc<EndpointCache>>,
    listeners: Option<Arc<ListenerCache>>,
    vhosts: Option<Arc<VirtualHostCache>>,
    stream_queue: Option<usize>,
}

impl XdsServerBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cluster cache served by CDS.
    #[must_use]
    pub fn clusters(mut self, cache: Arc<ClusterCache>) -> Self {
        self.clusters = Some(cache);
        self
    }

    /// Set the endpoint cache served by EDS.
    #[must_use]
    pub fn endpoints(mut self, cache: Arc<EndpointCache>) -> Self {
        self.endpoints = Some(cache);
        self
    }

    /// Set the listener cache served by LDS.
    #[must_use]
    pub fn listeners(mut self, cache: Arc<ListenerCache>) -> Self {
        self.listeners = Some(cache);
        self
    }

    /// Set the virtual-host caches served by RDS.
    #[must_use]
    pub fn virtual_hosts(mut self, cache: Arc<VirtualHostCache>) -> Self {
        self.vhosts = Some(cache);
        self
    }

    /// Set the per-stream outbound queue depth.
    #[must_use]
    pub fn stream_queue(mut self, depth: usize) -> Self {
        self.stream_queue = Some(depth);
        self
    }

    /// Build the server.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when any cache is missing.
    pub fn build(self) -> Result<XdsServer> {
        let mut config = ServerConfig::default();
        if let Some(depth) = self.stream_queue {
            config.stream_queue = depth;
        }
        Ok(XdsServer {
            clusters: self
                .clusters
                .ok_or_else(|| Error::Configuration("cluster cache is required".into()))?,
            endpoints: self
                .endpoints
                .ok_or_else(|| Error::Configuration("endpoint cache is required".into()))?,
            listeners: self
                .listeners
                .ok_or_else(|| Error::Configuration("listener cache is required".into()))?,
            vhosts: self
                .vhosts
                .ok_or_else(|| Error::Configuration("virtual-host cache is required".into()))?,
            config,
        })
    }
}
