//! Listener recomputation.
//!
//! Two listeners exist: `ingress_http`, present whenever at least one
//! admissible object routes plain HTTP, and `ingress_https`, carrying one
//! SNI-scoped filter chain per (object, TLS spec, secret) triple. A
//! listener whose filter-chain list would be empty is removed from the
//! cache instead.

use std::collections::BTreeMap;
use std::sync::Arc;

use isobar_api::{Ingress, IngressRoute, ObjectRef, Secret};
use isobar_cache::ListenerCache;
use isobar_types::auth::{CommonTlsContext, DownstreamTlsContext, TlsCertificate, TlsParameters};
use isobar_types::core::{address, data_source, socket_address, Address, DataSource, SocketAddress};
use isobar_types::listener::{Filter, FilterChain, FilterChainMatch, Listener};
use isobar_types::names;
use prost_types::{value::Kind, ListValue, Struct, Value};

use crate::annotations;
use crate::cluster::XDS_CLUSTER;
use crate::config::TranslatorConfig;

const HTTP_FILTER: &str = "envoy.http_connection_manager";
const ROUTER: &str = "envoy.router";
const GRPC_WEB: &str = "envoy.grpc_web";
const ACCESS_LOG: &str = "envoy.file_access_log";

type IngressSet = BTreeMap<ObjectRef, Arc<Ingress>>;
type RouteSet = BTreeMap<ObjectRef, Arc<IngressRoute>>;
type SecretSet = BTreeMap<ObjectRef, Arc<Secret>>;

/// Recompute both listeners.
pub(crate) fn recompute_listeners(
    cache: &ListenerCache,
    config: &TranslatorConfig,
    ingresses: &IngressSet,
    routes: &RouteSet,
    secrets: &SecretSet,
) {
    let (mut add, mut remove) = recompute_http_listener(config, ingresses, routes);
    let (ssl_add, ssl_remove) = recompute_tls_listener0(config, ingresses, routes, secrets);
    add.extend(ssl_add);
    remove.extend(ssl_remove);
    cache.add(add);
    cache.remove(remove);
}

/// Recompute only the TLS listener.
pub(crate) fn recompute_tls_listener(
    cache: &ListenerCache,
    config: &TranslatorConfig,
    ingresses: &IngressSet,
    routes: &RouteSet,
    secrets: &SecretSet,
) {
    let (add, remove) = recompute_tls_listener0(config, ingresses, routes, secrets);
    cache.add(add);
    cache.remove(remove);
}

// Recompute the non-TLS listener. Returns listeners to add and names to
// remove; the listener is removed when no admissible object wants HTTP.
fn recompute_http_listener(
    config: &TranslatorConfig,
    ingresses: &IngressSet,
    routes: &RouteSet,
) -> (Vec<Listener>, Vec<String>) {
    let valid = ingresses
        .values()
        .filter(|i| annotations::allow_http(&i.meta))
        .count()
        + routes.len();
    if valid == 0 {
        return (vec![], vec![names::INGRESS_HTTP.to_string()]);
    }

    let listener = Listener {
        name: names::INGRESS_HTTP.to_string(),
        address: Some(socketaddress(config.http_address(), config.http_port())),
        filter_chains: vec![filterchain(
            config.use_proxy_proto,
            vec![httpfilter(names::INGRESS_HTTP, config.http_access_log())],
        )],
    };
    (vec![listener], vec![])
}

// Recompute the TLS listener: one filter chain per (object, TLS spec,
// secret) triple with a resolvable keypair.
fn recompute_tls_listener0(
    config: &TranslatorConfig,
    ingresses: &IngressSet,
    routes: &RouteSet,
    secrets: &SecretSet,
) -> (Vec<Listener>, Vec<String>) {
    let mut chains = Vec::new();

    for ing in ingresses.values() {
        if ing.tls.is_empty() {
            // this ingress does not use TLS, skip it
            continue;
        }
        let min_proto = annotations::tls_minimum_protocol_version(&ing.meta);
        for tls in &ing.tls {
            let Some(secret) = lookup_keypair(secrets, &ing.meta.namespace, &tls.secret_name)
            else {
                // no usable secret for this spec yet, skip it
                continue;
            };
            chains.push(tls_filter_chain(
                config,
                tls.hosts.clone(),
                &secret,
                min_proto,
            ));
        }
    }

    for route in routes.values() {
        let Some(vh) = &route.virtual_host else {
            continue;
        };
        let Some(tls) = &vh.tls else {
            continue;
        };
        let Some(secret) = lookup_keypair(secrets, &route.meta.namespace, &tls.secret_name)
        else {
            continue;
        };
        let min_proto = annotations::tls_minimum_protocol_version(&route.meta);
        chains.push(tls_filter_chain(
            config,
            vec![vh.fqdn.clone()],
            &secret,
            min_proto,
        ));
    }

    if chains.is_empty() {
        return (vec![], vec![names::INGRESS_HTTPS.to_string()]);
    }
    let listener = Listener {
        name: names::INGRESS_HTTPS.to_string(),
        address: Some(socketaddress(config.https_address(), config.https_port())),
        filter_chains: chains,
    };
    (vec![listener], vec![])
}

fn lookup_keypair(
    secrets: &SecretSet,
    namespace: &str,
    secret_name: &str,
) -> Option<Arc<Secret>> {
    if secret_name.is_empty() {
        return None;
    }
    let secret = secrets.get(&ObjectRef::new(namespace, secret_name))?;
    if !secret.has_keypair() {
        // missing certificate or private key, skip it
        return None;
    }
    Some(Arc::clone(secret))
}

fn tls_filter_chain(
    config: &TranslatorConfig,
    sni_domains: Vec<String>,
    secret: &Secret,
    min_proto: isobar_types::auth::tls_parameters::TlsProtocol,
) -> FilterChain {
    FilterChain {
        filter_chain_match: Some(FilterChainMatch { sni_domains }),
        tls_context: Some(tlscontext(secret, min_proto, &["h2", "http/1.1"])),
        filters: vec![httpfilter(names::INGRESS_HTTPS, config.https_access_log())],
        use_proxy_proto: config.use_proxy_proto.then_some(true),
    }
}

pub(crate) fn socketaddress(address: &str, port: u32) -> Address {
    Address {
        address: Some(address::Address::SocketAddress(SocketAddress {
            protocol: socket_address::Protocol::Tcp as i32,
            address: address.to_string(),
            port_specifier: Some(socket_address::PortSpecifier::PortValue(port)),
        })),
    }
}

fn tlscontext(
    secret: &Secret,
    min_proto: isobar_types::auth::tls_parameters::TlsProtocol,
    alpn: &[&str],
) -> DownstreamTlsContext {
    DownstreamTlsContext {
        common_tls_context: Some(CommonTlsContext {
            tls_params: Some(TlsParameters {
                tls_minimum_protocol_version: min_proto as i32,
                tls_maximum_protocol_version: 0,
            }),
            tls_certificates: vec![TlsCertificate {
                certificate_chain: Some(DataSource {
                    specifier: Some(data_source::Specifier::InlineBytes(
                        secret.tls_certificate().unwrap_or_default().to_vec(),
                    )),
                }),
                private_key: Some(DataSource {
                    specifier: Some(data_source::Specifier::InlineBytes(
                        secret.tls_private_key().unwrap_or_default().to_vec(),
                    )),
                }),
            }],
            alpn_protocols: alpn.iter().map(|s| (*s).to_string()).collect(),
        }),
        require_client_certificate: None,
    }
}

fn filterchain(use_proxy: bool, filters: Vec<Filter>) -> FilterChain {
    FilterChain {
        filter_chain_match: None,
        tls_context: None,
        filters,
        use_proxy_proto: use_proxy.then_some(true),
    }
}

// The HTTP connection manager, configured to fetch its route table from
// RDS through the bootstrap cluster.
fn httpfilter(route_name: &str, access_log_path: &str) -> Filter {
    Filter {
        name: HTTP_FILTER.to_string(),
        config: Some(Struct {
            fields: [
                ("stat_prefix".to_string(), sv(route_name)),
                (
                    "rds".to_string(),
                    st([
                        ("route_config_name".to_string(), sv(route_name)),
                        (
                            "config_source".to_string(),
                            st([(
                                "api_config_source".to_string(),
                                st([
                                    ("api_type".to_string(), sv("GRPC")),
                                    ("cluster_names".to_string(), lv(vec![sv(XDS_CLUSTER)])),
                                    (
                                        "grpc_services".to_string(),
                                        lv(vec![st([(
                                            "envoy_grpc".to_string(),
                                            st([(
                                                "cluster_name".to_string(),
                                                sv(XDS_CLUSTER),
                                            )]),
                                        )])]),
                                    ),
                                ]),
                            )]),
                        ),
                    ]),
                ),
                (
                    "http_filters".to_string(),
                    lv(vec![
                        st([("name".to_string(), sv(GRPC_WEB))]),
                        st([("name".to_string(), sv(ROUTER))]),
                    ]),
                ),
                ("use_remote_address".to_string(), bv(true)),
                ("access_log".to_string(), accesslog(access_log_path)),
            ]
            .into_iter()
            .collect(),
        }),
    }
}

fn accesslog(path: &str) -> Value {
    lv(vec![st([
        ("name".to_string(), sv(ACCESS_LOG)),
        (
            "config".to_string(),
            st([("path".to_string(), sv(path))]),
        ),
    ])])
}

fn sv(s: &str) -> Value {
    Value {
        kind: Some(Kind::StringValue(s.to_string())),
    }
}

fn bv(b: bool) -> Value {
    Value {
        kind: Some(Kind::BoolValue(b)),
    }
}

fn st<const N: usize>(fields: [(String, Value); N]) -> Value {
    Value {
        kind: Some(Kind::StructValue(Struct {
            fields: fields.into_iter().collect(),
        })),
    }
}

fn lv(values: Vec<Value>) -> Value {
    Value {
        kind: Some(Kind::ListValue(ListValue { values })),
    }
}
