//! TLS contexts (`envoy.api.v2.auth`).

use crate::core::DataSource;

/// Negotiable TLS protocol bounds.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TlsParameters {
    /// Minimum accepted TLS version.
    #[prost(enumeration = "tls_parameters::TlsProtocol", tag = "1")]
    pub tls_minimum_protocol_version: i32,
    /// Maximum accepted TLS version.
    #[prost(enumeration = "tls_parameters::TlsProtocol", tag = "2")]
    pub tls_maximum_protocol_version: i32,
}

/// Nested types for [`TlsParameters`].
pub mod tls_parameters {
    /// TLS protocol versions.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum TlsProtocol {
        /// Let the TLS library pick.
        TlsAuto = 0,
        /// TLS 1.0.
        TlsV10 = 1,
        /// TLS 1.1.
        TlsV11 = 2,
        /// TLS 1.2.
        TlsV12 = 3,
        /// TLS 1.3.
        TlsV13 = 4,
    }
}

/// A certificate chain and its private key.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TlsCertificate {
    /// PEM certificate chain.
    #[prost(message, optional, tag = "1")]
    pub certificate_chain: Option<DataSource>,
    /// PEM private key.
    #[prost(message, optional, tag = "2")]
    pub private_key: Option<DataSource>,
}

/// TLS settings shared by upstream and downstream contexts.
#[derive(Clone, PartialEq, prost::Message)]
pub struct CommonTlsContext {
    /// Protocol bounds.
    #[prost(message, optional, tag = "1")]
    pub tls_params: Option<TlsParameters>,
    /// Certificates to present.
    #[prost(message, repeated, tag = "2")]
    pub tls_certificates: Vec<TlsCertificate>,
    /// ALPN protocols to advertise, in preference order.
    #[prost(string, repeated, tag = "4")]
    pub alpn_protocols: Vec<String>,
}

/// TLS context for accepted connections.
#[derive(Clone, PartialEq, prost::Message)]
pub struct DownstreamTlsContext {
    /// Shared TLS settings.
    #[prost(message, optional, tag = "1")]
    pub common_tls_context: Option<CommonTlsContext>,
    /// Whether to require a client certificate.
    #[prost(message, optional, tag = "2")]
    pub require_client_certificate: Option<bool>,
}

/// TLS context for originated connections.
#[derive(Clone, PartialEq, prost::Message)]
pub struct UpstreamTlsContext {
    /// Shared TLS settings.
    #[prost(message, optional, tag = "1")]
    pub common_tls_context: Option<CommonTlsContext>,
    /// SNI to present upstream.
    #[prost(string, tag = "2")]
    pub sni: String,
}
