//! # isobar-server
//!
//! The discovery side of the control plane: four gRPC services, one per
//! resource type, each offering a long-lived streaming watch and a
//! single-shot fetch over the same versioned snapshot assembly.
//!
//! Streams push: a client receives the current snapshot on subscription
//! and again after every change signal from the backing cache. Slow
//! clients overflow their own bounded queue and are disconnected with a
//! resource-exhausted status; other streams are unaffected.
//!
//! ## Example
//!
//! ```rust,ignore
//! use isobar_server::XdsServer;
//!
//! let server = XdsServer::builder()
//!     .clusters(translator.clusters())
//!     .endpoints(translator.endpoints())
//!     .listeners(translator.listeners())
//!     .virtual_hosts(translator.virtual_hosts())
//!     .build()?;
//! group.add(move |stop| server.serve(addr, stop));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod discovery;
pub mod services;
mod stream;

pub use builder::XdsServerBuilder;
pub use config::ServerConfig;
pub use discovery::{DiscoveryGrpc, DiscoveryService, DiscoverySource, SourceSnapshot};
pub use stream::{StreamContext, StreamId};

use std::net::SocketAddr;
use std::sync::Arc;

use isobar_cache::{ClusterCache, EndpointCache, ListenerCache, VirtualHostCache};
use isobar_core::Error;
use tokio::sync::watch;
use tracing::info;

use services::{ClusterSource, EndpointSource, ListenerSource, RouteSource};

/// The discovery server: the four per-type services bound to one socket.
#[derive(Debug)]
pub struct XdsServer {
    clusters: Arc<ClusterCache>,
    endpoints: Arc<EndpointCache>,
    listeners: Arc<ListenerCache>,
    vhosts: Arc<VirtualHostCache>,
    config: ServerConfig,
}

impl XdsServer {
    /// Create a builder for configuring the server.
    #[must_use]
    pub fn builder() -> XdsServerBuilder {
        XdsServerBuilder::new()
    }

    /// Serve discovery on `addr` until the stop signal fires.
    ///
    /// A bind failure is fatal and is returned for the worker group to
    /// propagate.
    pub async fn serve(
        self,
        addr: SocketAddr,
        stop: watch::Receiver<bool>,
    ) -> isobar_core::Result<()> {
        let cds = DiscoveryGrpc::new(DiscoveryService::new(
            Arc::new(ClusterSource::new(self.clusters)),
            stop.clone(),
            &self.config,
        ));
        let eds = DiscoveryGrpc::new(DiscoveryService::new(
            Arc::new(EndpointSource::new(self.endpoints)),
            stop.clone(),
            &self.config,
        ));
        let lds = DiscoveryGrpc::new(DiscoveryService::new(
            Arc::new(ListenerSource::new(self.listeners)),
            stop.clone(),
            &self.config,
        ));
        let rds = DiscoveryGrpc::new(DiscoveryService::new(
            Arc::new(RouteSource::new(self.vhosts)),
            stop.clone(),
            &self.config,
        ));

        let mut shutdown = stop;
        info!(%addr, "starting discovery server");
        tonic::transport::Server::builder()
            .add_service(cds)
            .add_service(eds)
            .add_service(lds)
            .add_service(rds)
            .serve_with_shutdown(addr, async move {
                let _ = shutdown.changed().await;
            })
            .await
            .map_err(|e| Error::transport("discovery listener", e))
    }
}
