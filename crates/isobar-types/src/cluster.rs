//! Upstream cluster configuration (`envoy.api.v2.Cluster`).

use crate::auth::UpstreamTlsContext;
use crate::core::{ConfigSource, Http2ProtocolOptions};

/// A logical upstream pool.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Cluster {
    /// Cluster name; the route table refers to clusters by this name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// How members are discovered.
    #[prost(enumeration = "cluster::DiscoveryType", tag = "2")]
    pub r#type: i32,
    /// EDS binding, set when `type` is `Eds`.
    #[prost(message, optional, tag = "3")]
    pub eds_cluster_config: Option<cluster::EdsClusterConfig>,
    /// Timeout for establishing upstream connections.
    #[prost(message, optional, tag = "4")]
    pub connect_timeout: Option<prost_types::Duration>,
    /// Load-balancing policy across members.
    #[prost(enumeration = "cluster::LbPolicy", tag = "6")]
    pub lb_policy: i32,
    /// TLS context for upstream connections.
    #[prost(message, optional, tag = "11")]
    pub tls_context: Option<UpstreamTlsContext>,
    /// Presence enables HTTP/2 to the upstream.
    #[prost(message, optional, tag = "14")]
    pub http2_protocol_options: Option<Http2ProtocolOptions>,
}

/// Nested types for [`Cluster`].
pub mod cluster {
    use super::ConfigSource;

    /// Member discovery mode.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum DiscoveryType {
        /// Statically configured members.
        Static = 0,
        /// DNS, all addresses.
        StrictDns = 1,
        /// DNS, single logical address.
        LogicalDns = 2,
        /// Members fetched via EDS.
        Eds = 3,
        /// Forward to the original destination.
        OriginalDst = 4,
    }

    /// Load-balancing policy.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum LbPolicy {
        /// Round-robin over healthy members.
        RoundRobin = 0,
        /// Pick the member with the fewest active requests.
        LeastRequest = 1,
        /// Consistent hashing ring.
        RingHash = 2,
        /// Uniformly random.
        Random = 3,
    }

    /// EDS binding for a cluster.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct EdsClusterConfig {
        /// Where to fetch endpoint assignments from.
        #[prost(message, optional, tag = "1")]
        pub eds_config: Option<ConfigSource>,
        /// Assignment name to request; defaults to the cluster name.
        #[prost(string, tag = "2")]
        pub service_name: String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn cluster_round_trip() {
        let c = Cluster {
            name: "default/kuard/443".to_string(),
            r#type: cluster::DiscoveryType::Eds as i32,
            eds_cluster_config: Some(cluster::EdsClusterConfig {
                eds_config: None,
                service_name: "default/kuard/https".to_string(),
            }),
            connect_timeout: Some(prost_types::Duration {
                seconds: 0,
                nanos: 250_000_000,
            }),
            lb_policy: cluster::LbPolicy::RoundRobin as i32,
            tls_context: None,
            http2_protocol_options: None,
        };
        let bytes = c.encode_to_vec();
        assert_eq!(Cluster::decode(bytes.as_slice()).unwrap(), c);
    }
}
