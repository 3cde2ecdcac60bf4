//! Event dispatch and recomputation ordering.
//!
//! The [`Translator`] owns the object cache and the four resource caches.
//! Each event updates the object cache first, then re-derives exactly the
//! derived state the event can have touched. All methods run on the event
//! buffer's single consumer task.

use std::collections::BTreeSet;
use std::sync::Arc;

use isobar_api::{Endpoints, Ingress, IngressRoute, Object, Secret, Service};
use isobar_cache::{ClusterCache, EndpointCache, ListenerCache, VirtualHostCache};
use tracing::warn;

use crate::annotations;
use crate::buffer::EventHandler;
use crate::cluster::recompute_service;
use crate::config::TranslatorConfig;
use crate::endpoints::recompute_cluster_load_assignments;
use crate::listener::{recompute_listeners, recompute_tls_listener};
use crate::object_cache::{ingress_hosts, route_host, ObjectCache};
use crate::vhost::recompute_vhost;

/// Translates object events into resource cache updates.
pub struct Translator {
    config: TranslatorConfig,
    cache: ObjectCache,
    clusters: Arc<ClusterCache>,
    endpoints: Arc<EndpointCache>,
    listeners: Arc<ListenerCache>,
    vhosts: Arc<VirtualHostCache>,
}

impl Translator {
    /// Create a translator with empty caches.
    #[must_use]
    pub fn new(config: TranslatorConfig) -> Self {
        Self {
            config,
            cache: ObjectCache::new(),
            clusters: Arc::new(ClusterCache::new()),
            endpoints: Arc::new(EndpointCache::new()),
            listeners: Arc::new(ListenerCache::new()),
            vhosts: Arc::new(VirtualHostCache::new()),
        }
    }

    /// The cluster cache (CDS).
    #[must_use]
    pub fn clusters(&self) -> Arc<ClusterCache> {
        Arc::clone(&self.clusters)
    }

    /// The endpoint cache (EDS).
    #[must_use]
    pub fn endpoints(&self) -> Arc<EndpointCache> {
        Arc::clone(&self.endpoints)
    }

    /// The listener cache (LDS).
    #[must_use]
    pub fn listeners(&self) -> Arc<ListenerCache> {
        Arc::clone(&self.listeners)
    }

    /// The virtual-host caches (RDS).
    #[must_use]
    pub fn virtual_hosts(&self) -> Arc<VirtualHostCache> {
        Arc::clone(&self.vhosts)
    }

    // whether this object's ingress class matches the configured class;
    // objects with no class annotation always match
    fn class_allowed(&self, meta: &isobar_api::ObjectMeta) -> bool {
        match meta.annotation(annotations::INGRESS_CLASS) {
            Some(class) => class == self.config.ingress_class(),
            None => true,
        }
    }

    fn add_service(&mut self, svc: Arc<Service>) {
        let old = self.cache.insert_service(Arc::clone(&svc));
        recompute_service(&self.clusters, old.as_deref(), Some(&svc));
    }

    fn remove_service(&mut self, svc: &Service) {
        let old = self.cache.remove_service(&svc.meta.to_ref());
        recompute_service(&self.clusters, old.as_deref().or(Some(svc)), None);
    }

    fn add_endpoints(&mut self, ep: Arc<Endpoints>) {
        let old = self.cache.insert_endpoints(Arc::clone(&ep));
        recompute_cluster_load_assignments(&self.endpoints, old.as_deref(), Some(&ep));
    }

    fn remove_endpoints(&mut self, ep: &Endpoints) {
        let old = self.cache.remove_endpoints(&ep.meta.to_ref());
        recompute_cluster_load_assignments(&self.endpoints, old.as_deref().or(Some(ep)), None);
    }

    fn add_secret(&mut self, secret: Arc<Secret>) {
        self.cache.insert_secret(Arc::clone(&secret));
        self.recompute_after_secret(&secret);
    }

    fn remove_secret(&mut self, secret: &Secret) {
        self.cache.remove_secret(&secret.meta.to_ref());
        self.recompute_after_secret(secret);
    }

    // A secret feeds the TLS listener's filter chains and the HTTPS
    // admission of every host whose TLS spec references it, so both are
    // re-derived from the current object set.
    fn recompute_after_secret(&mut self, secret: &Secret) {
        recompute_tls_listener(
            &self.listeners,
            &self.config,
            self.cache.ingresses(),
            self.cache.routes(),
            self.cache.secrets(),
        );

        let hosts = self.hosts_referencing_secret(secret);
        if hosts.is_empty() {
            return;
        }
        for host in &hosts {
            self.recompute_host(host);
        }
        self.vhosts.notify();
    }

    fn hosts_referencing_secret(&self, secret: &Secret) -> BTreeSet<String> {
        let mut hosts = BTreeSet::new();
        for ing in self.cache.ingresses().values() {
            if ing.meta.namespace == secret.meta.namespace
                && ing.tls.iter().any(|t| t.secret_name == secret.meta.name)
            {
                hosts.extend(ingress_hosts(ing));
            }
        }
        for route in self.cache.routes().values() {
            let references = route
                .virtual_host
                .as_ref()
                .and_then(|vh| vh.tls.as_ref())
                .is_some_and(|tls| tls.secret_name == secret.meta.name);
            if references && route.meta.namespace == secret.meta.namespace {
                hosts.insert(route_host(route).to_string());
            }
        }
        hosts
    }

    fn add_ingress(&mut self, ing: Arc<Ingress>) {
        if !self.class_allowed(&ing.meta) {
            // this ingress belongs to another controller
            return;
        }
        let mut hosts = ingress_hosts(&ing);
        if let Some(old) = self.cache.insert_ingress(ing) {
            // a replacement may have moved between hosts
            hosts.extend(ingress_hosts(&old));
        }
        self.recompute_after_routing_change(&hosts);
    }

    fn remove_ingress(&mut self, ing: &Ingress) {
        if !self.class_allowed(&ing.meta) {
            return;
        }
        let Some(old) = self.cache.remove_ingress(&ing.meta.to_ref()) else {
            return;
        };
        self.recompute_after_routing_change(&ingress_hosts(&old));
    }

    fn add_ingress_route(&mut self, route: Arc<IngressRoute>) {
        if !self.class_allowed(&route.meta) {
            return;
        }
        let mut hosts = BTreeSet::from([route_host(&route).to_string()]);
        if let Some(old) = self.cache.insert_route(route) {
            hosts.insert(route_host(&old).to_string());
        }
        self.recompute_after_routing_change(&hosts);
    }

    fn remove_ingress_route(&mut self, route: &IngressRoute) {
        if !self.class_allowed(&route.meta) {
            return;
        }
        let Some(old) = self.cache.remove_route(&route.meta.to_ref()) else {
            return;
        };
        let host = route_host(&old).to_string();
        self.recompute_after_routing_change(&BTreeSet::from([host]));
    }

    // listeners depend on the full routing object set; virtual hosts only
    // on the touched hosts
    fn recompute_after_routing_change(&mut self, hosts: &BTreeSet<String>) {
        recompute_listeners(
            &self.listeners,
            &self.config,
            self.cache.ingresses(),
            self.cache.routes(),
            self.cache.secrets(),
        );
        for host in hosts {
            self.recompute_host(host);
        }
        // watchers wake even when only route contents changed
        self.vhosts.notify();
    }

    fn recompute_host(&self, host: &str) {
        recompute_vhost(
            &self.vhosts,
            host,
            self.cache.ingresses_for_host(host),
            self.cache.routes_for_host(host),
            self.cache.secrets(),
        );
    }
}

impl EventHandler for Translator {
    fn on_add(&mut self, obj: Object) {
        match obj {
            Object::Service(svc) => self.add_service(svc),
            Object::Endpoints(ep) => self.add_endpoints(ep),
            Object::Secret(secret) => self.add_secret(secret),
            Object::Ingress(ing) => self.add_ingress(ing),
            Object::IngressRoute(route) => self.add_ingress_route(route),
            Object::Tombstone(inner) => {
                warn!(kind = inner.kind(), "tombstone in add event, unwrapping");
                self.on_add(*inner);
            }
        }
    }

    fn on_update(&mut self, old: Object, new: Object) {
        let old = old.unwrap_tombstone();
        match (old, new) {
            (Object::Service(_), Object::Service(svc)) => {
                // insert_service replaces the cached object; the previous
                // version comes back from the cache for cleanup
                self.add_service(svc);
            }
            (Object::Endpoints(_), Object::Endpoints(ep)) => self.add_endpoints(ep),
            (Object::Secret(_), Object::Secret(secret)) => self.add_secret(secret),
            (Object::Ingress(old), Object::Ingress(new)) => {
                self.remove_ingress(&old);
                self.add_ingress(new);
            }
            (Object::IngressRoute(old), Object::IngressRoute(new)) => {
                self.remove_ingress_route(&old);
                self.add_ingress_route(new);
            }
            (old, new) => {
                warn!(
                    old = old.kind(),
                    new = new.kind(),
                    "mismatched kinds in update event, ignoring"
                );
            }
        }
    }

    fn on_delete(&mut self, obj: Object) {
        match obj {
            Object::Service(svc) => self.remove_service(&svc),
            Object::Endpoints(ep) => self.remove_endpoints(&ep),
            Object::Secret(secret) => self.remove_secret(&secret),
            Object::Ingress(ing) => self.remove_ingress(&ing),
            Object::IngressRoute(route) => self.remove_ingress_route(&route),
            // recurse into ourselves with the tombstoned value
            Object::Tombstone(inner) => self.on_delete(*inner),
        }
    }
}
