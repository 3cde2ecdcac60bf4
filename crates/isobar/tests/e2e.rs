//! End-to-end tests: events enter through the buffer, the translator
//! derives configuration, and the discovery services serve it.

use std::sync::Arc;

use isobar::prelude::*;
use isobar::server::services::{ClusterSource, RouteSource};
use isobar::server::{DiscoveryService, ServerConfig};
use isobar::types::discovery::DiscoveryRequest;
use isobar::types::route::{route, route_action, RouteConfiguration};
use isobar::types::Message;
use isobar_api::{
    HttpIngressPath, Ingress, IngressBackend, IngressRule, ObjectMeta, PortRef, Service,
    ServicePort,
};
use tokio::sync::watch;

fn ingress(namespace: &str, name: &str, host: Option<&str>, paths: Vec<(&str, &str, u32)>) -> Object {
    Object::Ingress(Arc::new(Ingress {
        meta: ObjectMeta::new(namespace, name),
        backend: None,
        rules: vec![IngressRule {
            host: host.map(str::to_string),
            paths: paths
                .into_iter()
                .map(|(path, svc, port)| HttpIngressPath {
                    path: Some(path.to_string()),
                    backend: IngressBackend {
                        service_name: svc.to_string(),
                        service_port: PortRef::Number(port),
                    },
                })
                .collect(),
        }],
        tls: vec![],
    }))
}

fn default_backend(namespace: &str, name: &str, svc: &str, port: u32) -> Object {
    Object::Ingress(Arc::new(Ingress {
        meta: ObjectMeta::new(namespace, name),
        backend: Some(IngressBackend {
            service_name: svc.to_string(),
            service_port: PortRef::Number(port),
        }),
        rules: vec![],
        tls: vec![],
    }))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

// run events through the buffer on a worker group and hand back the
// translator's caches once the group has drained and stopped
async fn translate(events: Vec<Object>) -> (Arc<ClusterCache>, Arc<VirtualHostCache>) {
    init_tracing();
    let translator = Translator::new(TranslatorConfig::default());
    let clusters = translator.clusters();
    let vhosts = translator.virtual_hosts();

    let mut group = WorkerGroup::new();
    let buffer = Buffer::new(&mut group, translator, 128, true);
    for event in events {
        buffer.on_add(event).await;
    }
    drop(buffer);
    group.run().await.unwrap();

    (clusters, vhosts)
}

#[tokio::test]
async fn default_backend_yields_the_wildcard_vhost() {
    let (_, vhosts) = translate(vec![default_backend("default", "kuard", "kuard", 80)]).await;

    let http = vhosts.http().contents();
    assert_eq!(http.len(), 1);
    assert_eq!(http[0].name, "*");
    assert_eq!(http[0].domains, vec!["*"]);
    match http[0].routes[0].action.as_ref() {
        Some(route::Action::Route(ra)) => match ra.cluster_specifier.as_ref() {
            Some(route_action::ClusterSpecifier::Cluster(c)) => {
                assert_eq!(c, "default/kuard/80");
            }
            other => panic!("unexpected cluster specifier {other:?}"),
        },
        other => panic!("unexpected action {other:?}"),
    }
}

#[tokio::test]
async fn services_surface_as_clusters_over_cds() {
    let service = Object::Service(Arc::new(Service {
        meta: ObjectMeta::new("default", "kuard"),
        ports: vec![ServicePort {
            name: Some("http".to_string()),
            port: 80,
            target_port: Some(8080),
        }],
    }));
    let (clusters, _) = translate(vec![service]).await;

    let (_tx, stop) = watch::channel(false);
    let svc = DiscoveryService::new(
        Arc::new(ClusterSource::new(clusters)),
        stop,
        &ServerConfig::default(),
    );
    let response = svc
        .fetch(tonic::Request::new(DiscoveryRequest::default()))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.type_url, "type.googleapis.com/envoy.api.v2.Cluster");
    assert_eq!(response.nonce, response.version_info);
    let names: Vec<String> = response
        .resources
        .iter()
        .map(|any| {
            isobar::types::cluster::Cluster::decode(any.value.as_slice())
                .unwrap()
                .name
        })
        .collect();
    assert_eq!(names, vec!["default/kuard/80", "default/kuard/http"]);
}

#[tokio::test]
async fn rds_serves_ordered_routes_with_redirects() {
    // ingress A forces ssl on "/", ingress B carries the acme path
    let mut app = match ingress(
        "default",
        "app",
        Some("example.com"),
        vec![("/", "app", 8080)],
    ) {
        Object::Ingress(i) => (*i).clone(),
        _ => unreachable!(),
    };
    app.meta.annotations.insert(
        "ingress.kubernetes.io/force-ssl-redirect".to_string(),
        "true".to_string(),
    );
    let challenge = ingress(
        "default",
        "challenge",
        Some("example.com"),
        vec![(
            "/.well-known/acme-challenge/depth",
            "challenge-service",
            8009,
        )],
    );

    let (_, vhosts) = translate(vec![Object::Ingress(Arc::new(app)), challenge]).await;

    let (_tx, stop) = watch::channel(false);
    let svc = DiscoveryService::new(
        Arc::new(RouteSource::new(vhosts)),
        stop,
        &ServerConfig::default(),
    );

    // filtering by name returns only the requested table
    let response = svc
        .fetch(tonic::Request::new(DiscoveryRequest {
            resource_names: vec!["ingress_http".to_string()],
            ..Default::default()
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.resources.len(), 1);

    let table = RouteConfiguration::decode(response.resources[0].value.as_slice()).unwrap();
    assert_eq!(table.name, "ingress_http");
    assert_eq!(table.virtual_hosts.len(), 1);
    let vh = &table.virtual_hosts[0];
    assert_eq!(vh.name, "example.com");

    // longest prefix first: the acme route keeps its cluster, the root
    // redirects
    assert_eq!(vh.routes.len(), 2);
    assert!(matches!(
        vh.routes[0].action,
        Some(route::Action::Route(_))
    ));
    assert!(matches!(
        vh.routes[1].action,
        Some(route::Action::Redirect(_))
    ));
}

#[tokio::test]
async fn updates_reach_waiting_watchers() {
    init_tracing();
    let translator = Translator::new(TranslatorConfig::default());
    let vhosts = translator.virtual_hosts();
    let mut signal = vhosts.subscribe();

    let mut group = WorkerGroup::new();
    let buffer = Buffer::new(&mut group, translator, 16, true);
    let running = tokio::spawn(group.run());

    buffer
        .on_add(default_backend("default", "kuard", "kuard", 80))
        .await;

    // the watcher wakes without polling
    tokio::time::timeout(std::time::Duration::from_secs(5), signal.changed())
        .await
        .expect("watcher should wake")
        .unwrap();
    assert_eq!(vhosts.http().contents().len(), 1);

    drop(buffer);
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn permutations_converge_to_identical_configuration() {
    let events = |order: &[usize]| {
        let all = [
            default_backend("default", "kuard", "kuard", 80),
            ingress(
                "default",
                "admin",
                Some("admin.example.com"),
                vec![("/admin", "admin", 9000)],
            ),
            Object::Service(Arc::new(Service {
                meta: ObjectMeta::new("default", "kuard"),
                ports: vec![ServicePort {
                    name: None,
                    port: 80,
                    target_port: None,
                }],
            })),
        ];
        order.iter().map(|i| all[*i].clone()).collect::<Vec<_>>()
    };

    let (clusters_a, vhosts_a) = translate(events(&[0, 1, 2])).await;
    let (clusters_b, vhosts_b) = translate(events(&[2, 0, 1])).await;
    let (clusters_c, vhosts_c) = translate(events(&[1, 2, 0])).await;

    assert_eq!(clusters_a.contents(), clusters_b.contents());
    assert_eq!(clusters_b.contents(), clusters_c.contents());
    assert_eq!(vhosts_a.http().contents(), vhosts_b.http().contents());
    assert_eq!(vhosts_b.http().contents(), vhosts_c.http().contents());
}
