//! # isobar-types
//!
//! Hand-maintained Rust bindings for the subset of the Envoy v2 data-plane
//! API that isobar emits: clusters, endpoint assignments, listeners, route
//! configurations, and the discovery request/response envelope.
//!
//! The structs carry prost field attributes matching the upstream proto
//! definitions, so their encoded bytes are wire-compatible with a proxy
//! consuming the v2 xDS API. Well-known types (`Any`, `Duration`, `Struct`)
//! come from `prost-types`.

#![deny(unsafe_code)]

pub mod auth;
pub mod cluster;
pub mod core;
pub mod discovery;
pub mod endpoint;
pub mod listener;
pub mod route;

pub use prost::Message;
pub use prost_types::Any;

/// Type URLs for the resource types served over discovery.
pub mod type_url {
    /// Cluster type URL (CDS).
    pub const CLUSTER: &str = "type.googleapis.com/envoy.api.v2.Cluster";
    /// ClusterLoadAssignment type URL (EDS).
    pub const ENDPOINT: &str = "type.googleapis.com/envoy.api.v2.ClusterLoadAssignment";
    /// Listener type URL (LDS).
    pub const LISTENER: &str = "type.googleapis.com/envoy.api.v2.Listener";
    /// RouteConfiguration type URL (RDS).
    pub const ROUTE: &str = "type.googleapis.com/envoy.api.v2.RouteConfiguration";
    /// VirtualHost type URL (route table member).
    pub const VIRTUAL_HOST: &str = "type.googleapis.com/envoy.api.v2.route.VirtualHost";
}

/// Well-known resource names.
pub mod names {
    /// Name of the non-TLS listener and its route configuration.
    pub const INGRESS_HTTP: &str = "ingress_http";
    /// Name of the TLS listener and its route configuration.
    pub const INGRESS_HTTPS: &str = "ingress_https";
}

/// A discoverable resource: named, type-tagged, and encodable as `Any`.
pub trait Resource: prost::Message + Sized {
    /// The type URL identifying this resource's proto message type.
    const TYPE_URL: &'static str;

    /// The resource name clients filter on.
    fn name(&self) -> &str;

    /// Encode this resource as a type-tagged `Any` message.
    fn to_any(&self) -> prost_types::Any {
        prost_types::Any {
            type_url: Self::TYPE_URL.to_string(),
            value: self.encode_to_vec(),
        }
    }
}

impl Resource for cluster::Cluster {
    const TYPE_URL: &'static str = type_url::CLUSTER;

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for endpoint::ClusterLoadAssignment {
    const TYPE_URL: &'static str = type_url::ENDPOINT;

    fn name(&self) -> &str {
        &self.cluster_name
    }
}

impl Resource for listener::Listener {
    const TYPE_URL: &'static str = type_url::LISTENER;

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for route::RouteConfiguration {
    const TYPE_URL: &'static str = type_url::ROUTE;

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for route::VirtualHost {
    const TYPE_URL: &'static str = type_url::VIRTUAL_HOST;

    fn name(&self) -> &str {
        &self.name
    }
}
