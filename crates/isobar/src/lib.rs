//! # isobar
//!
//! The core of an ingress control plane: it ingests declarative routing
//! objects from a cluster orchestrator, maintains an in-memory model of
//! routing intent, derives Envoy v2 configuration from it, and serves
//! that configuration to any number of proxies over the xDS streaming
//! discovery protocol.
//!
//! Data flow:
//!
//! ```text
//! cluster events → Buffer → Translator → resource caches → xDS streams
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use isobar::prelude::*;
//!
//! let mut group = WorkerGroup::new();
//! let translator = Translator::new(TranslatorConfig::default());
//! let server = XdsServer::builder()
//!     .clusters(translator.clusters())
//!     .endpoints(translator.endpoints())
//!     .listeners(translator.listeners())
//!     .virtual_hosts(translator.virtual_hosts())
//!     .build()?;
//! let buffer = Buffer::new(&mut group, translator, 128, true);
//!
//! // hand `buffer` to the orchestrator client, then:
//! group.add(move |stop| server.serve("0.0.0.0:8001".parse().unwrap(), stop));
//! group.run().await?;
//! ```
//!
//! This crate re-exports the member crates under stable names.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub use isobar_api as api;
pub use isobar_cache as cache;
pub use isobar_core as core;
pub use isobar_server as server;
pub use isobar_translate as translate;
pub use isobar_types as types;

/// Convenient imports for control plane assembly.
pub mod prelude {
    pub use isobar_api::{Object, ObjectMeta, ObjectRef};
    pub use isobar_cache::{
        ClusterCache, EndpointCache, ListenerCache, ResourceCache, VirtualHostCache,
    };
    pub use isobar_core::{Error, Result, VersionCounter, WorkerGroup};
    pub use isobar_server::{XdsServer, XdsServerBuilder};
    pub use isobar_translate::{Buffer, EventHandler, Translator, TranslatorConfig};
}

/// Version information for this crate.
pub mod version {
    /// Crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Get version info as a string.
    #[must_use]
    pub fn version_string() -> String {
        format!("isobar {VERSION}")
    }
}
