//! Shared configuration primitives (`envoy.api.v2.core`).

/// A network address.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Address {
    /// The concrete address kind.
    #[prost(oneof = "address::Address", tags = "1, 2")]
    pub address: Option<address::Address>,
}

/// Nested types for [`Address`].
pub mod address {
    /// Address kind.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Address {
        /// An IP socket address.
        #[prost(message, tag = "1")]
        SocketAddress(super::SocketAddress),
        /// A Unix domain socket.
        #[prost(message, tag = "2")]
        Pipe(super::Pipe),
    }
}

/// An IP socket address and port.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SocketAddress {
    /// Transport protocol.
    #[prost(enumeration = "socket_address::Protocol", tag = "1")]
    pub protocol: i32,
    /// The address to bind or connect to.
    #[prost(string, tag = "2")]
    pub address: String,
    /// Port, by value or by name.
    #[prost(oneof = "socket_address::PortSpecifier", tags = "3, 4")]
    pub port_specifier: Option<socket_address::PortSpecifier>,
}

/// Nested types for [`SocketAddress`].
pub mod socket_address {
    /// Transport protocol.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum Protocol {
        /// TCP.
        Tcp = 0,
        /// UDP.
        Udp = 1,
    }

    /// Port, by value or by name.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum PortSpecifier {
        /// Numeric port.
        #[prost(uint32, tag = "3")]
        PortValue(u32),
        /// Named port, resolved by the host environment.
        #[prost(string, tag = "4")]
        NamedPort(String),
    }
}

/// A Unix domain socket path.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Pipe {
    /// Filesystem path of the socket.
    #[prost(string, tag = "1")]
    pub path: String,
}

/// Bytes supplied inline or by reference.
#[derive(Clone, PartialEq, prost::Message)]
pub struct DataSource {
    /// Where the data comes from.
    #[prost(oneof = "data_source::Specifier", tags = "1, 2, 3")]
    pub specifier: Option<data_source::Specifier>,
}

/// Nested types for [`DataSource`].
pub mod data_source {
    /// Where the data comes from.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Specifier {
        /// A local file path.
        #[prost(string, tag = "1")]
        Filename(String),
        /// Raw bytes carried inline.
        #[prost(bytes, tag = "2")]
        InlineBytes(Vec<u8>),
        /// A UTF-8 string carried inline.
        #[prost(string, tag = "3")]
        InlineString(String),
    }
}

/// Where a dynamic configuration source lives.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ConfigSource {
    /// The configuration source kind.
    #[prost(oneof = "config_source::ConfigSourceSpecifier", tags = "2")]
    pub config_source_specifier: Option<config_source::ConfigSourceSpecifier>,
}

/// Nested types for [`ConfigSource`].
pub mod config_source {
    /// The configuration source kind.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum ConfigSourceSpecifier {
        /// Fetch from a management API.
        #[prost(message, tag = "2")]
        ApiConfigSource(super::ApiConfigSource),
    }
}

/// A management API endpoint for dynamic configuration.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ApiConfigSource {
    /// API flavor (REST or gRPC).
    #[prost(enumeration = "api_config_source::ApiType", tag = "1")]
    pub api_type: i32,
    /// Upstream clusters hosting the API.
    #[prost(string, repeated, tag = "2")]
    pub cluster_names: Vec<String>,
    /// gRPC services hosting the API.
    #[prost(message, repeated, tag = "4")]
    pub grpc_services: Vec<GrpcService>,
}

/// Nested types for [`ApiConfigSource`].
pub mod api_config_source {
    /// API flavor.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum ApiType {
        /// Legacy REST (unsupported).
        UnsupportedRestLegacy = 0,
        /// REST-JSON.
        Rest = 1,
        /// gRPC streaming.
        Grpc = 2,
    }
}

/// A gRPC service endpoint.
#[derive(Clone, PartialEq, prost::Message)]
pub struct GrpcService {
    /// How to reach the service.
    #[prost(oneof = "grpc_service::TargetSpecifier", tags = "1")]
    pub target_specifier: Option<grpc_service::TargetSpecifier>,
}

/// Nested types for [`GrpcService`].
pub mod grpc_service {
    /// How to reach the service.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum TargetSpecifier {
        /// Via an upstream cluster using the proxy's own gRPC client.
        #[prost(message, tag = "1")]
        EnvoyGrpc(EnvoyGrpc),
    }

    /// An upstream cluster target.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct EnvoyGrpc {
        /// Name of the upstream cluster.
        #[prost(string, tag = "1")]
        pub cluster_name: String,
    }
}

/// HTTP/2 protocol options. Presence alone enables HTTP/2 upstream.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Http2ProtocolOptions {}

/// Identity of an xDS client node.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Node {
    /// Opaque node identifier.
    #[prost(string, tag = "1")]
    pub id: String,
    /// Cluster the node belongs to.
    #[prost(string, tag = "2")]
    pub cluster: String,
    /// Opaque node metadata.
    #[prost(message, optional, tag = "3")]
    pub metadata: Option<prost_types::Struct>,
}
