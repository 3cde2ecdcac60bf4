//! Endpoints → ClusterLoadAssignment recomputation.

use std::collections::BTreeMap;

use isobar_api::Endpoints;
use isobar_cache::EndpointCache;
use isobar_types::core::{address, socket_address, Address, SocketAddress};
use isobar_types::endpoint::{
    ClusterLoadAssignment, Endpoint, LbEndpoint, LocalityLbEndpoints,
};

use crate::cluster::servicename;

/// Recompute the endpoint assignments derived from an Endpoints object.
///
/// One assignment is emitted per distinct (service, port-name) pair; its
/// name matches the EDS service name the corresponding clusters reference.
/// Passing `None` for `new` removes the object's assignments.
pub(crate) fn recompute_cluster_load_assignments(
    cache: &EndpointCache,
    old: Option<&Endpoints>,
    new: Option<&Endpoints>,
) {
    let add = assignments(new);
    let keep: Vec<&String> = add.keys().collect();
    let remove: Vec<String> = assignments(old)
        .into_keys()
        .filter(|name| !keep.contains(&name))
        .collect();

    cache.add(add.into_values());
    cache.remove(remove);
}

fn assignments(ep: Option<&Endpoints>) -> BTreeMap<String, ClusterLoadAssignment> {
    let mut out = BTreeMap::new();
    let Some(ep) = ep else {
        return out;
    };
    for subset in &ep.subsets {
        for port in &subset.ports {
            let name = servicename(&ep.meta, port.name.as_deref());
            let cla = out
                .entry(name.clone())
                .or_insert_with(|| ClusterLoadAssignment {
                    cluster_name: name,
                    endpoints: vec![LocalityLbEndpoints {
                        lb_endpoints: vec![],
                    }],
                });
            for address in &subset.addresses {
                cla.endpoints[0]
                    .lb_endpoints
                    .push(lb_endpoint(address, port.port));
            }
        }
    }
    out
}

fn lb_endpoint(address: &str, port: u32) -> LbEndpoint {
    LbEndpoint {
        endpoint: Some(Endpoint {
            address: Some(Address {
                address: Some(address::Address::SocketAddress(SocketAddress {
                    protocol: socket_address::Protocol::Tcp as i32,
                    address: address.to_string(),
                    port_specifier: Some(socket_address::PortSpecifier::PortValue(port)),
                })),
            }),
        }),
    }
}
