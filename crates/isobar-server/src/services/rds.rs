//! Route Discovery Service (RDS).
//!
//! The two route configurations are fixed: `ingress_http` aggregates the
//! HTTP virtual hosts and `ingress_https` the HTTPS ones. They are
//! assembled from the virtual-host tables at snapshot time rather than
//! cached themselves.

use std::sync::Arc;

use isobar_cache::VirtualHostCache;
use isobar_types::route::RouteConfiguration;
use isobar_types::{names, type_url, Resource};
use tokio::sync::watch;

use crate::discovery::{DiscoverySource, SourceSnapshot};

/// Serves the route configurations derived from the virtual-host tables.
#[derive(Debug)]
pub struct RouteSource {
    vhosts: Arc<VirtualHostCache>,
}

impl RouteSource {
    /// Create a source over the virtual-host tables.
    pub fn new(vhosts: Arc<VirtualHostCache>) -> Self {
        Self { vhosts }
    }
}

impl DiscoverySource for RouteSource {
    const TYPE_URL: &'static str = type_url::ROUTE;
    const SERVICE_NAME: &'static str = "envoy.api.v2.RouteDiscoveryService";
    const STREAM_METHOD: &'static str = "StreamRoutes";
    const FETCH_METHOD: &'static str = "FetchRoutes";

    fn fetch(&self) -> SourceSnapshot {
        let version = self.vhosts.version();
        let tables = [
            RouteConfiguration {
                name: names::INGRESS_HTTP.to_string(),
                virtual_hosts: self.vhosts.http().contents(),
            },
            RouteConfiguration {
                name: names::INGRESS_HTTPS.to_string(),
                virtual_hosts: self.vhosts.https().contents(),
            },
        ];
        SourceSnapshot {
            version,
            resources: tables
                .into_iter()
                .map(|rc| (rc.name().to_string(), rc.to_any()))
                .collect(),
        }
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.vhosts.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isobar_types::route::VirtualHost;

    #[test]
    fn both_route_configurations_are_always_present() {
        let vhosts = Arc::new(VirtualHostCache::new());
        let snapshot = RouteSource::new(Arc::clone(&vhosts)).fetch();
        let names: Vec<_> = snapshot.resources.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["ingress_http", "ingress_https"]);
    }

    #[test]
    fn vhost_changes_advance_the_route_version() {
        let vhosts = Arc::new(VirtualHostCache::new());
        let source = RouteSource::new(Arc::clone(&vhosts));
        assert_eq!(source.fetch().version, "0");

        vhosts.http().add([VirtualHost {
            name: "*".to_string(),
            domains: vec!["*".to_string()],
            routes: vec![],
        }]);
        assert_eq!(source.fetch().version, "1");
    }
}
