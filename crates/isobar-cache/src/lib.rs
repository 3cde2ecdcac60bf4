//! # isobar-cache
//!
//! Versioned, name-indexed collections of proxy-config entities with a
//! broadcast "changed" signal.
//!
//! The translator is the sole writer; any number of discovery streams read
//! concurrently. A cache's version is a monotone counter rendered as a
//! decimal string; it advances on every mutation that adds, replaces, or
//! removes an entry. Observers subscribe to a watch channel carrying the
//! latest version — wake-ups coalesce, so a busy observer sees only the
//! newest value when it next looks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;

pub use cache::ResourceCache;

use std::sync::Arc;

use tokio::sync::watch;

use cache::Signal;

/// Cache of [`isobar_types::cluster::Cluster`] entries (CDS).
pub type ClusterCache = ResourceCache<isobar_types::cluster::Cluster>;

/// Cache of [`isobar_types::endpoint::ClusterLoadAssignment`] entries (EDS).
pub type EndpointCache = ResourceCache<isobar_types::endpoint::ClusterLoadAssignment>;

/// Cache of [`isobar_types::listener::Listener`] entries (LDS).
pub type ListenerCache = ResourceCache<isobar_types::listener::Listener>;

/// The virtual-host caches backing the two fixed route configurations.
///
/// Internally split into an HTTP and an HTTPS table. The two tables share
/// one version counter and one change signal, so a route-configuration
/// observer subscribes once and sees a version that is monotone across
/// both schemes.
#[derive(Debug)]
pub struct VirtualHostCache {
    http: ResourceCache<isobar_types::route::VirtualHost>,
    https: ResourceCache<isobar_types::route::VirtualHost>,
    signal: Arc<Signal>,
}

impl Default for VirtualHostCache {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualHostCache {
    /// Create an empty pair of tables.
    #[must_use]
    pub fn new() -> Self {
        let signal = Arc::new(Signal::new());
        Self {
            http: ResourceCache::with_signal(Arc::clone(&signal)),
            https: ResourceCache::with_signal(Arc::clone(&signal)),
            signal,
        }
    }

    /// The HTTP route table.
    #[must_use]
    pub fn http(&self) -> &ResourceCache<isobar_types::route::VirtualHost> {
        &self.http
    }

    /// The HTTPS route table.
    #[must_use]
    pub fn https(&self) -> &ResourceCache<isobar_types::route::VirtualHost> {
        &self.https
    }

    /// The shared version, as a decimal string.
    #[must_use]
    pub fn version(&self) -> String {
        self.signal.version()
    }

    /// Subscribe to the shared change signal.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.signal.subscribe()
    }

    /// Wake observers without bumping the version.
    pub fn notify(&self) {
        self.signal.notify();
    }
}
