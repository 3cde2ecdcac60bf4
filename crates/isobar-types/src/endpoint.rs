//! Endpoint assignments (`envoy.api.v2.ClusterLoadAssignment`).

use crate::core::Address;

/// The concrete members of a cluster.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ClusterLoadAssignment {
    /// Assignment name; matches the requesting cluster's EDS service name.
    #[prost(string, tag = "1")]
    pub cluster_name: String,
    /// Members grouped by locality.
    #[prost(message, repeated, tag = "2")]
    pub endpoints: Vec<LocalityLbEndpoints>,
}

/// A locality-scoped group of endpoints.
#[derive(Clone, PartialEq, prost::Message)]
pub struct LocalityLbEndpoints {
    /// The endpoints in this group.
    #[prost(message, repeated, tag = "2")]
    pub lb_endpoints: Vec<LbEndpoint>,
}

/// A single load-balanced endpoint.
#[derive(Clone, PartialEq, prost::Message)]
pub struct LbEndpoint {
    /// The endpoint itself.
    #[prost(message, optional, tag = "1")]
    pub endpoint: Option<Endpoint>,
}

/// An upstream host.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Endpoint {
    /// The host's address and port.
    #[prost(message, optional, tag = "1")]
    pub address: Option<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{address, socket_address, SocketAddress};
    use prost::Message;

    #[test]
    fn assignment_round_trip() {
        let cla = ClusterLoadAssignment {
            cluster_name: "default/kuard".to_string(),
            endpoints: vec![LocalityLbEndpoints {
                lb_endpoints: vec![LbEndpoint {
                    endpoint: Some(Endpoint {
                        address: Some(Address {
                            address: Some(address::Address::SocketAddress(SocketAddress {
                                protocol: socket_address::Protocol::Tcp as i32,
                                address: "10.0.0.1".to_string(),
                                port_specifier: Some(socket_address::PortSpecifier::PortValue(
                                    8080,
                                )),
                            })),
                        }),
                    }),
                }],
            }],
        };
        let bytes = cla.encode_to_vec();
        assert_eq!(ClusterLoadAssignment::decode(bytes.as_slice()).unwrap(), cla);
    }
}
