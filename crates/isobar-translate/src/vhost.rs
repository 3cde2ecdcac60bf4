//! Per-host VirtualHost recomputation.
//!
//! A host's virtual host is re-derived from scratch from the objects
//! currently routing to it — never diffed against its previous contents.
//! Routes from Ingress rules and IngressRoute specs are merged into one
//! ordered table per scheme.

use std::collections::BTreeMap;
use std::sync::Arc;

use isobar_api::{Ingress, IngressRoute, ObjectRef, RouteService, Secret};
use isobar_cache::VirtualHostCache;
use isobar_types::route::{
    route, route_action, route_match, RedirectAction, Route, RouteAction, RouteMatch,
    VirtualHost, WeightedCluster, weighted_cluster,
};
use tracing::warn;

use crate::annotations;
use crate::hashname::hashname;
use crate::object_cache::WILDCARD_HOST;

// characters that turn a path into a regex match
const REGEX_CHARS: &[char] = &['^', '+', '*', '[', ']', '%'];

// longest permitted VirtualHost name
const MAX_VHOST_NAME_LEN: usize = 60;

type IngressSet = BTreeMap<ObjectRef, Arc<Ingress>>;
type RouteSet = BTreeMap<ObjectRef, Arc<IngressRoute>>;
type SecretSet = BTreeMap<ObjectRef, Arc<Secret>>;

/// Recompute the HTTP and HTTPS virtual hosts for one host.
///
/// `ingresses` and `routes` are the objects currently contributing to the
/// host; either may be absent. A host with no routes, or failing a
/// scheme's admission rule, is removed from that scheme's table.
pub(crate) fn recompute_vhost(
    cache: &VirtualHostCache,
    vhost: &str,
    ingresses: Option<&IngressSet>,
    routes: Option<&RouteSet>,
    secrets: &SecretSet,
) {
    let mut http_routes = Vec::new();
    let mut https_routes = Vec::new();
    let mut allow_http = true;
    let mut tls_admitted = false;

    if let Some(ingresses) = ingresses {
        for ing in ingresses.values() {
            if !annotations::allow_http(&ing.meta) {
                allow_http = false;
            }
            if valid_tls_spec_for_vhost(vhost, ing, secrets) {
                tls_admitted = true;
            }
            collect_ingress_routes(vhost, ing, &mut http_routes, &mut https_routes);
        }
    }

    if let Some(routes) = routes {
        for ir in routes.values() {
            if valid_route_tls(vhost, ir, secrets) {
                tls_admitted = true;
            }
            collect_ingress_route_routes(ir, &mut http_routes, &mut https_routes);
        }
    }

    sort_routes(&mut http_routes);
    sort_routes(&mut https_routes);

    let name = vhostname(vhost);

    if http_routes.is_empty() || !allow_http {
        cache.http().remove([&name]);
    } else {
        cache.http().add([VirtualHost {
            name: name.clone(),
            domains: domains(vhost, 80),
            routes: http_routes,
        }]);
    }

    if https_routes.is_empty() || !tls_admitted {
        cache.https().remove([&name]);
    } else {
        cache.https().add([VirtualHost {
            name,
            domains: domains(vhost, 443),
            routes: https_routes,
        }]);
    }
}

// The routes an Ingress contributes to this host, appended per scheme.
// force-ssl-redirect rewrites the HTTP action only; the HTTPS table always
// carries the cluster action.
fn collect_ingress_routes(
    vhost: &str,
    ing: &Ingress,
    http: &mut Vec<Route>,
    https: &mut Vec<Route>,
) {
    let force_ssl = annotations::force_ssl_redirect(&ing.meta);
    let timeout = annotations::request_timeout(&ing.meta);
    let websockets = annotations::websocket_routes(&ing.meta);

    let mut paths: Vec<(String, String)> = Vec::new();

    if vhost == WILDCARD_HOST {
        if let Some(backend) = &ing.backend {
            paths.push((
                "/".to_string(),
                format!(
                    "{}/{}/{}",
                    ing.meta.namespace, backend.service_name, backend.service_port
                ),
            ));
        }
    }

    for rule in &ing.rules {
        let rule_host = rule
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or(WILDCARD_HOST);
        if rule_host != vhost {
            continue;
        }
        for path in &rule.paths {
            paths.push((
                path.path.clone().unwrap_or_else(|| "/".to_string()),
                format!(
                    "{}/{}/{}",
                    ing.meta.namespace, path.backend.service_name, path.backend.service_port
                ),
            ));
        }
    }

    for (path, cluster) in paths {
        let websocket = websockets.contains(&path);
        let matcher = route_match(&path);
        https.push(Route {
            r#match: Some(matcher.clone()),
            action: Some(cluster_action(cluster.clone(), timeout.clone(), websocket)),
        });
        let action = if force_ssl {
            route::Action::Redirect(RedirectAction {
                https_redirect: true,
            })
        } else {
            cluster_action(cluster, timeout.clone(), websocket)
        };
        http.push(Route {
            r#match: Some(matcher),
            action: Some(action),
        });
    }
}

// The routes an IngressRoute contributes, appended per scheme.
fn collect_ingress_route_routes(ir: &IngressRoute, http: &mut Vec<Route>, https: &mut Vec<Route>) {
    for spec in &ir.routes {
        let Some(action) = route_action_for_services(&ir.meta.namespace, &spec.services) else {
            warn!(
                route = %ir.meta.to_ref(),
                path = %spec.path_match,
                "route has no services, skipping"
            );
            continue;
        };
        let matcher = route_match(&spec.path_match);
        http.push(Route {
            r#match: Some(matcher.clone()),
            action: Some(action.clone()),
        });
        https.push(Route {
            r#match: Some(matcher),
            action: Some(action),
        });
    }
}

// A single backend becomes a plain cluster action; several become a
// weighted split.
fn route_action_for_services(namespace: &str, services: &[RouteService]) -> Option<route::Action> {
    match services {
        [] => None,
        [only] => Some(cluster_action(
            format!("{}/{}/{}", namespace, only.name, only.port),
            None,
            false,
        )),
        many => {
            let weights = cluster_weights(many);
            Some(route::Action::Route(RouteAction {
                cluster_specifier: Some(route_action::ClusterSpecifier::WeightedClusters(
                    WeightedCluster {
                        clusters: many
                            .iter()
                            .zip(weights)
                            .map(|(svc, weight)| weighted_cluster::ClusterWeight {
                                name: format!("{}/{}/{}", namespace, svc.name, svc.port),
                                weight: Some(weight),
                            })
                            .collect(),
                    },
                )),
                timeout: None,
                use_websocket: None,
            }))
        }
    }
}

/// Weights for a multi-backend route.
///
/// All weights specified: passed through verbatim. Some specified: the
/// unspecified backends share the remainder of 100, split evenly. None
/// specified: 100 split evenly. Even splits round down, with the leftover
/// going to the earliest backends.
fn cluster_weights(services: &[RouteService]) -> Vec<u32> {
    let unspecified = services.iter().filter(|s| s.weight.is_none()).count();
    if unspecified == 0 {
        return services.iter().map(|s| s.weight.unwrap_or(0)).collect();
    }

    let specified: u32 = services.iter().filter_map(|s| s.weight).sum();
    let pool = 100u32.saturating_sub(specified);
    let mut shares = split_evenly(pool, unspecified);

    services
        .iter()
        .map(|s| match s.weight {
            Some(w) => w,
            None => shares.next().unwrap_or(0),
        })
        .collect()
}

// Split total into n shares, rounding down with the remainder going to
// the earliest shares.
fn split_evenly(total: u32, n: usize) -> impl Iterator<Item = u32> {
    let n = n as u32;
    let base = total / n;
    let extra = total % n;
    (0..n).map(move |i| if i < extra { base + 1 } else { base })
}

fn route_match(path: &str) -> RouteMatch {
    let specifier = if path.contains(REGEX_CHARS) {
        route_match::PathSpecifier::Regex(path.to_string())
    } else {
        route_match::PathSpecifier::Prefix(path.to_string())
    };
    RouteMatch {
        path_specifier: Some(specifier),
    }
}

fn cluster_action(
    cluster: String,
    timeout: Option<prost_types::Duration>,
    websocket: bool,
) -> route::Action {
    route::Action::Route(RouteAction {
        cluster_specifier: Some(route_action::ClusterSpecifier::Cluster(cluster)),
        timeout,
        use_websocket: websocket.then_some(true),
    })
}

// Longest match first; equal lengths order lexicographically. Envoy tries
// routes in order, so the most specific prefix must come first.
fn sort_routes(routes: &mut [Route]) {
    routes.sort_by(|a, b| {
        let (a, b) = (match_str(a), match_str(b));
        b.len().cmp(&a.len()).then_with(|| a.cmp(b))
    });
}

fn match_str(route: &Route) -> &str {
    match route.r#match.as_ref().and_then(|m| m.path_specifier.as_ref()) {
        Some(route_match::PathSpecifier::Prefix(s))
        | Some(route_match::PathSpecifier::Path(s))
        | Some(route_match::PathSpecifier::Regex(s)) => s,
        None => "",
    }
}

/// The VirtualHost name for a host, bounded to 60 bytes.
pub(crate) fn vhostname(vhost: &str) -> String {
    hashname(MAX_VHOST_NAME_LEN, &[vhost])
}

fn domains(vhost: &str, port: u32) -> Vec<String> {
    if vhost == WILDCARD_HOST {
        vec![WILDCARD_HOST.to_string()]
    } else {
        vec![vhost.to_string(), format!("{vhost}:{port}")]
    }
}

// TLS admission for an ingress: some TLS spec must name this host and
// resolve to a secret holding a full keypair.
fn valid_tls_spec_for_vhost(vhost: &str, ing: &Ingress, secrets: &SecretSet) -> bool {
    if vhost == WILDCARD_HOST {
        return false;
    }
    ing.tls.iter().any(|tls| {
        !tls.secret_name.is_empty()
            && tls.hosts.iter().any(|h| h == vhost)
            && secrets
                .get(&ObjectRef::new(&ing.meta.namespace, &tls.secret_name))
                .is_some_and(|s| s.has_keypair())
    })
}

// TLS admission for an ingress route, analogous to the ingress rule.
fn valid_route_tls(vhost: &str, ir: &IngressRoute, secrets: &SecretSet) -> bool {
    if vhost == WILDCARD_HOST {
        return false;
    }
    ir.virtual_host
        .as_ref()
        .and_then(|vh| vh.tls.as_ref())
        .is_some_and(|tls| {
            !tls.secret_name.is_empty()
                && secrets
                    .get(&ObjectRef::new(&ir.meta.namespace, &tls.secret_name))
                    .is_some_and(|s| s.has_keypair())
        })
}
