//! The discovery request/response envelope (`envoy.api.v2.Discovery{Request,Response}`).

use crate::core::Node;

/// A request for resources of one type.
#[derive(Clone, PartialEq, prost::Message)]
pub struct DiscoveryRequest {
    /// Version of the last accepted response; empty on the first request.
    #[prost(string, tag = "1")]
    pub version_info: String,
    /// The requesting node.
    #[prost(message, optional, tag = "2")]
    pub node: Option<Node>,
    /// Names of the resources to return; empty requests everything.
    #[prost(string, repeated, tag = "3")]
    pub resource_names: Vec<String>,
    /// Type URL of the requested resources.
    #[prost(string, tag = "4")]
    pub type_url: String,
    /// Nonce of the most recent response, echoed back by the client.
    #[prost(string, tag = "5")]
    pub response_nonce: String,
    /// Populated when the client rejects a previous response.
    #[prost(message, optional, tag = "6")]
    pub error_detail: Option<rpc::Status>,
}

/// A versioned snapshot of resources of one type.
#[derive(Clone, PartialEq, prost::Message)]
pub struct DiscoveryResponse {
    /// Version of this snapshot.
    #[prost(string, tag = "1")]
    pub version_info: String,
    /// The resources, each encoded as a type-tagged `Any`.
    #[prost(message, repeated, tag = "2")]
    pub resources: Vec<prost_types::Any>,
    /// Canary flag; unused by this control plane.
    #[prost(bool, tag = "3")]
    pub canary: bool,
    /// Type URL of the carried resources.
    #[prost(string, tag = "4")]
    pub type_url: String,
    /// Nonce identifying this response.
    #[prost(string, tag = "5")]
    pub nonce: String,
}

/// `google.rpc` status, carried on NACKs.
pub mod rpc {
    /// An error status.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Status {
        /// Status code.
        #[prost(int32, tag = "1")]
        pub code: i32,
        /// Developer-facing message.
        #[prost(string, tag = "2")]
        pub message: String,
        /// Error details.
        #[prost(message, repeated, tag = "3")]
        pub details: Vec<prost_types::Any>,
    }
}
