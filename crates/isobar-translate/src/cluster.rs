//! Service → Cluster recomputation.

use std::collections::BTreeSet;

use isobar_api::{ObjectMeta, Service};
use isobar_cache::ClusterCache;
use isobar_types::auth::{CommonTlsContext, UpstreamTlsContext};
use isobar_types::cluster::{cluster, Cluster};
use isobar_types::core::{
    api_config_source, ApiConfigSource, ConfigSource, GrpcService, Http2ProtocolOptions,
    config_source, grpc_service,
};

use crate::annotations;

/// Name of the bootstrap cluster through which the proxy reaches this
/// control plane for EDS and RDS.
pub(crate) const XDS_CLUSTER: &str = "isobar";

const CONNECT_TIMEOUT_NANOS: i32 = 250_000_000;

#[derive(Clone, Copy, PartialEq)]
enum UpstreamProtocol {
    Http1,
    H2c,
    H2,
}

/// Recompute the clusters belonging to a service.
///
/// Emits two clusters per named port (one keyed by port number, one by
/// port name) and one per unnamed port; removes every previously emitted
/// name that the new object no longer produces. Passing `None` for `new`
/// removes the service's clusters entirely.
pub(crate) fn recompute_service(
    cache: &ClusterCache,
    old: Option<&Service>,
    new: Option<&Service>,
) {
    let mut add = Vec::new();
    if let Some(svc) = new {
        let h2c = annotations::upstream_protocol_ports(&svc.meta, "h2c");
        let h2 = annotations::upstream_protocol_ports(&svc.meta, "h2");
        for port in &svc.ports {
            let number = port.port.to_string();
            let protocol = if h2.contains(&number)
                || port.name.as_deref().is_some_and(|n| h2.contains(n))
            {
                UpstreamProtocol::H2
            } else if h2c.contains(&number)
                || port.name.as_deref().is_some_and(|n| h2c.contains(n))
            {
                UpstreamProtocol::H2c
            } else {
                UpstreamProtocol::Http1
            };

            match port.name.as_deref() {
                Some(name) => {
                    let eds_name = servicename(&svc.meta, Some(name));
                    add.push(eds_cluster(
                        servicename(&svc.meta, Some(&number)),
                        eds_name.clone(),
                        protocol,
                    ));
                    add.push(eds_cluster(eds_name.clone(), eds_name, protocol));
                }
                None => add.push(eds_cluster(
                    servicename(&svc.meta, Some(&number)),
                    servicename(&svc.meta, None),
                    protocol,
                )),
            }
        }
    }

    let keep: BTreeSet<&str> = add.iter().map(|c| c.name.as_str()).collect();
    let remove: Vec<String> = old
        .map(cluster_names)
        .unwrap_or_default()
        .into_iter()
        .filter(|name| !keep.contains(name.as_str()))
        .collect();

    cache.add(add);
    cache.remove(remove);
}

/// Every cluster name a service produces.
fn cluster_names(svc: &Service) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for port in &svc.ports {
        let number = port.port.to_string();
        names.insert(servicename(&svc.meta, Some(&number)));
        if let Some(name) = port.name.as_deref() {
            names.insert(servicename(&svc.meta, Some(name)));
        }
    }
    names
}

/// The fixed name for a service and optional port name:
/// `{namespace}/{name}` or `{namespace}/{name}/{portname}`.
pub(crate) fn servicename(meta: &ObjectMeta, portname: Option<&str>) -> String {
    match portname {
        Some(p) if !p.is_empty() => format!("{}/{}/{}", meta.namespace, meta.name, p),
        _ => format!("{}/{}", meta.namespace, meta.name),
    }
}

fn eds_cluster(name: String, service_name: String, protocol: UpstreamProtocol) -> Cluster {
    Cluster {
        name,
        r#type: cluster::DiscoveryType::Eds as i32,
        eds_cluster_config: Some(cluster::EdsClusterConfig {
            eds_config: Some(apiconfigsource(XDS_CLUSTER)),
            service_name,
        }),
        connect_timeout: Some(prost_types::Duration {
            seconds: 0,
            nanos: CONNECT_TIMEOUT_NANOS,
        }),
        lb_policy: cluster::LbPolicy::RoundRobin as i32,
        tls_context: match protocol {
            UpstreamProtocol::H2 => Some(UpstreamTlsContext {
                common_tls_context: Some(CommonTlsContext {
                    tls_params: None,
                    tls_certificates: vec![],
                    alpn_protocols: vec!["h2".to_string()],
                }),
                sni: String::new(),
            }),
            _ => None,
        },
        http2_protocol_options: match protocol {
            UpstreamProtocol::H2 | UpstreamProtocol::H2c => Some(Http2ProtocolOptions {}),
            UpstreamProtocol::Http1 => None,
        },
    }
}

/// A gRPC config source reaching the named bootstrap cluster.
pub(crate) fn apiconfigsource(cluster_name: &str) -> ConfigSource {
    ConfigSource {
        config_source_specifier: Some(config_source::ConfigSourceSpecifier::ApiConfigSource(
            ApiConfigSource {
                api_type: api_config_source::ApiType::Grpc as i32,
                cluster_names: vec![cluster_name.to_string()],
                grpc_services: vec![GrpcService {
                    target_specifier: Some(grpc_service::TargetSpecifier::EnvoyGrpc(
                        grpc_service::EnvoyGrpc {
                            cluster_name: cluster_name.to_string(),
                        },
                    )),
                }],
            },
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isobar_api::ServicePort;

    fn service(namespace: &str, name: &str, ports: Vec<ServicePort>) -> Service {
        Service {
            meta: ObjectMeta::new(namespace, name),
            ports,
        }
    }

    fn service_with_annotations(
        namespace: &str,
        name: &str,
        annotations: &[(&str, &str)],
        ports: Vec<ServicePort>,
    ) -> Service {
        let mut svc = service(namespace, name, ports);
        for (k, v) in annotations {
            svc.meta
                .annotations
                .insert((*k).to_string(), (*v).to_string());
        }
        svc
    }

    fn names(cache: &ClusterCache) -> Vec<String> {
        cache.contents().into_iter().map(|c| c.name).collect()
    }

    fn eds_service_name(cache: &ClusterCache, cluster: &str) -> String {
        cache
            .contents()
            .into_iter()
            .find(|c| c.name == cluster)
            .and_then(|c| c.eds_cluster_config)
            .map(|e| e.service_name)
            .expect("cluster present")
    }

    #[test]
    fn add_unnamed_service() {
        let cache = ClusterCache::new();
        let svc = service(
            "default",
            "kuard",
            vec![ServicePort {
                name: None,
                port: 443,
                target_port: Some(8443),
            }],
        );
        recompute_service(&cache, None, Some(&svc));

        assert_eq!(names(&cache), vec!["default/kuard/443"]);
        assert_eq!(
            eds_service_name(&cache, "default/kuard/443"),
            "default/kuard"
        );
        let c = &cache.contents()[0];
        assert_eq!(c.r#type, cluster::DiscoveryType::Eds as i32);
        assert_eq!(c.lb_policy, cluster::LbPolicy::RoundRobin as i32);
        assert_eq!(
            c.connect_timeout,
            Some(prost_types::Duration {
                seconds: 0,
                nanos: 250_000_000
            })
        );
    }

    #[test]
    fn naming_a_previously_unnamed_port_adds_the_named_cluster() {
        let cache = ClusterCache::new();
        let old = service(
            "default",
            "kuard",
            vec![ServicePort {
                name: None,
                port: 443,
                target_port: Some(8443),
            }],
        );
        recompute_service(&cache, None, Some(&old));

        let new = service(
            "default",
            "kuard",
            vec![ServicePort {
                name: Some("https".to_string()),
                port: 443,
                target_port: Some(8443),
            }],
        );
        recompute_service(&cache, Some(&old), Some(&new));

        assert_eq!(
            names(&cache),
            vec!["default/kuard/443", "default/kuard/https"]
        );
        // both keys reference the same endpoint assignment
        assert_eq!(
            eds_service_name(&cache, "default/kuard/443"),
            "default/kuard/https"
        );
        assert_eq!(
            eds_service_name(&cache, "default/kuard/https"),
            "default/kuard/https"
        );
    }

    #[test]
    fn removing_the_port_name_drops_the_named_cluster() {
        let cache = ClusterCache::new();
        let old = service(
            "default",
            "kuard",
            vec![ServicePort {
                name: Some("https".to_string()),
                port: 443,
                target_port: Some(8443),
            }],
        );
        recompute_service(&cache, None, Some(&old));

        let new = service(
            "default",
            "kuard",
            vec![ServicePort {
                name: None,
                port: 443,
                target_port: Some(8443),
            }],
        );
        recompute_service(&cache, Some(&old), Some(&new));

        assert_eq!(names(&cache), vec!["default/kuard/443"]);
        assert_eq!(
            eds_service_name(&cache, "default/kuard/443"),
            "default/kuard"
        );
    }

    #[test]
    fn removing_a_named_port_removes_both_clusters() {
        let cache = ClusterCache::new();
        let old = service(
            "default",
            "kuard",
            vec![
                ServicePort {
                    name: Some("http".to_string()),
                    port: 80,
                    target_port: Some(8080),
                },
                ServicePort {
                    name: Some("https".to_string()),
                    port: 443,
                    target_port: Some(8443),
                },
            ],
        );
        recompute_service(&cache, None, Some(&old));
        assert_eq!(cache.len(), 4);

        let new = service(
            "default",
            "kuard",
            vec![ServicePort {
                name: Some("https".to_string()),
                port: 443,
                target_port: Some(8443),
            }],
        );
        recompute_service(&cache, Some(&old), Some(&new));

        assert_eq!(
            names(&cache),
            vec!["default/kuard/443", "default/kuard/https"]
        );
    }

    #[test]
    fn deleting_the_service_removes_every_cluster() {
        let cache = ClusterCache::new();
        let svc = service(
            "default",
            "kuard",
            vec![ServicePort {
                name: Some("http".to_string()),
                port: 80,
                target_port: None,
            }],
        );
        recompute_service(&cache, None, Some(&svc));
        assert_eq!(cache.len(), 2);

        recompute_service(&cache, Some(&svc), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn h2c_upstream_sets_http2_options() {
        let cache = ClusterCache::new();
        let svc = service_with_annotations(
            "default",
            "kuard",
            &[("isobar.dev/upstream-protocol.h2c", "80,http")],
            vec![ServicePort {
                name: Some("http".to_string()),
                port: 80,
                target_port: None,
            }],
        );
        recompute_service(&cache, None, Some(&svc));

        for c in cache.contents() {
            assert!(c.http2_protocol_options.is_some(), "{}", c.name);
            assert!(c.tls_context.is_none(), "{}", c.name);
        }
    }

    #[test]
    fn h2_upstream_adds_alpn_tls_context() {
        let cache = ClusterCache::new();
        let svc = service_with_annotations(
            "default",
            "kuard",
            &[("isobar.dev/upstream-protocol.h2", "443,https")],
            vec![ServicePort {
                name: Some("https".to_string()),
                port: 443,
                target_port: None,
            }],
        );
        recompute_service(&cache, None, Some(&svc));

        for c in cache.contents() {
            assert!(c.http2_protocol_options.is_some(), "{}", c.name);
            let alpn = c
                .tls_context
                .as_ref()
                .and_then(|t| t.common_tls_context.as_ref())
                .map(|c| c.alpn_protocols.clone())
                .expect("tls context present");
            assert_eq!(alpn, vec!["h2"]);
        }
    }

    #[test]
    fn servicename_forms() {
        let meta = ObjectMeta::new("default", "kuard");
        assert_eq!(servicename(&meta, Some("http")), "default/kuard/http");
        assert_eq!(servicename(&meta, None), "default/kuard");
        assert_eq!(servicename(&meta, Some("")), "default/kuard");
    }
}
