//! Route tables (`envoy.api.v2.RouteConfiguration` and `envoy.api.v2.route`).

/// A named collection of virtual hosts.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RouteConfiguration {
    /// Route configuration name, referenced from the connection manager.
    #[prost(string, tag = "1")]
    pub name: String,
    /// The virtual hosts making up this table.
    #[prost(message, repeated, tag = "2")]
    pub virtual_hosts: Vec<VirtualHost>,
}

/// A host-scoped ordered sequence of routes.
#[derive(Clone, PartialEq, prost::Message)]
pub struct VirtualHost {
    /// Virtual host name; unique within the route configuration.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Domains matched against the host header. `*` matches everything.
    #[prost(string, repeated, tag = "2")]
    pub domains: Vec<String>,
    /// Routes, tried in order; the first match wins.
    #[prost(message, repeated, tag = "3")]
    pub routes: Vec<Route>,
}

/// A single (match, action) pair.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Route {
    /// What requests this route matches.
    #[prost(message, optional, tag = "1")]
    pub r#match: Option<RouteMatch>,
    /// What to do with matched requests.
    #[prost(oneof = "route::Action", tags = "2, 3")]
    pub action: Option<route::Action>,
}

/// Nested types for [`Route`].
pub mod route {
    /// What to do with matched requests.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Action {
        /// Forward to an upstream cluster.
        #[prost(message, tag = "2")]
        Route(super::RouteAction),
        /// Return a redirect.
        #[prost(message, tag = "3")]
        Redirect(super::RedirectAction),
    }
}

/// Request matching criteria.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RouteMatch {
    /// Path matching rule.
    #[prost(oneof = "route_match::PathSpecifier", tags = "1, 2, 3")]
    pub path_specifier: Option<route_match::PathSpecifier>,
}

/// Nested types for [`RouteMatch`].
pub mod route_match {
    /// Path matching rule.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum PathSpecifier {
        /// Match on a path prefix.
        #[prost(string, tag = "1")]
        Prefix(String),
        /// Match the exact path.
        #[prost(string, tag = "2")]
        Path(String),
        /// Match the path against a regular expression.
        #[prost(string, tag = "3")]
        Regex(String),
    }
}

/// Forwarding action.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RouteAction {
    /// The target cluster(s).
    #[prost(oneof = "route_action::ClusterSpecifier", tags = "1, 3")]
    pub cluster_specifier: Option<route_action::ClusterSpecifier>,
    /// Upstream timeout. Zero disables the timeout; unset uses the
    /// proxy default.
    #[prost(message, optional, tag = "8")]
    pub timeout: Option<prost_types::Duration>,
    /// Whether to allow websocket upgrades on this route.
    #[prost(message, optional, tag = "16")]
    pub use_websocket: Option<bool>,
}

/// Nested types for [`RouteAction`].
pub mod route_action {
    /// The target cluster(s).
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum ClusterSpecifier {
        /// A single upstream cluster, by name.
        #[prost(string, tag = "1")]
        Cluster(String),
        /// Several clusters with traffic split by weight.
        #[prost(message, tag = "3")]
        WeightedClusters(super::WeightedCluster),
    }
}

/// A weighted traffic split across clusters.
#[derive(Clone, PartialEq, prost::Message)]
pub struct WeightedCluster {
    /// The clusters and their weights.
    #[prost(message, repeated, tag = "1")]
    pub clusters: Vec<weighted_cluster::ClusterWeight>,
}

/// Nested types for [`WeightedCluster`].
pub mod weighted_cluster {
    /// One cluster's share of the split.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct ClusterWeight {
        /// Cluster name.
        #[prost(string, tag = "1")]
        pub name: String,
        /// Relative weight out of the total across all entries.
        #[prost(message, optional, tag = "2")]
        pub weight: Option<u32>,
    }
}

/// Redirect action.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RedirectAction {
    /// Redirect to the HTTPS scheme with a 301.
    #[prost(bool, tag = "4")]
    pub https_redirect: bool,
}
