//! Listener configuration (`envoy.api.v2.Listener` and `envoy.api.v2.listener`).

use crate::auth::DownstreamTlsContext;
use crate::core::Address;

/// A bound network socket with per-connection processing pipelines.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Listener {
    /// Listener name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Address the listener binds.
    #[prost(message, optional, tag = "2")]
    pub address: Option<Address>,
    /// Filter chains, selected per connection.
    #[prost(message, repeated, tag = "3")]
    pub filter_chains: Vec<FilterChain>,
}

/// A per-connection processing pipeline, optionally scoped by SNI.
#[derive(Clone, PartialEq, prost::Message)]
pub struct FilterChain {
    /// Criteria selecting this chain.
    #[prost(message, optional, tag = "1")]
    pub filter_chain_match: Option<FilterChainMatch>,
    /// TLS termination context for this chain.
    #[prost(message, optional, tag = "2")]
    pub tls_context: Option<DownstreamTlsContext>,
    /// Network filters applied in order.
    #[prost(message, repeated, tag = "3")]
    pub filters: Vec<Filter>,
    /// Expect a PROXY protocol header on new connections.
    #[prost(message, optional, tag = "4")]
    pub use_proxy_proto: Option<bool>,
}

/// Criteria for selecting a filter chain.
#[derive(Clone, PartialEq, prost::Message)]
pub struct FilterChainMatch {
    /// SNI domains this chain serves.
    #[prost(string, repeated, tag = "4")]
    pub sni_domains: Vec<String>,
}

/// A named network filter with an opaque config.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Filter {
    /// Filter name, e.g. `envoy.http_connection_manager`.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Filter configuration.
    #[prost(message, optional, tag = "2")]
    pub config: Option<prost_types::Struct>,
}
