//! The translator's view of the cluster: the latest version of every
//! observed object, plus per-host indices of the objects routing to each
//! host.
//!
//! All writes come from the event buffer's single consumer, so the cache
//! is plain owned state with no interior locking.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use isobar_api::{Endpoints, Ingress, IngressRoute, ObjectRef, Secret, Service};

/// The host every rule without an explicit host contributes to.
pub(crate) const WILDCARD_HOST: &str = "*";

#[derive(Debug, Default)]
pub(crate) struct ObjectCache {
    services: BTreeMap<ObjectRef, Arc<Service>>,
    endpoints: BTreeMap<ObjectRef, Arc<Endpoints>>,
    secrets: BTreeMap<ObjectRef, Arc<Secret>>,
    ingresses: BTreeMap<ObjectRef, Arc<Ingress>>,
    routes: BTreeMap<ObjectRef, Arc<IngressRoute>>,

    // host → the ingresses currently routing to it
    vhost_ingresses: BTreeMap<String, BTreeMap<ObjectRef, Arc<Ingress>>>,
    // host → the ingress routes currently routing to it
    vhost_routes: BTreeMap<String, BTreeMap<ObjectRef, Arc<IngressRoute>>>,
}

impl ObjectCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_service(&mut self, svc: Arc<Service>) -> Option<Arc<Service>> {
        self.services.insert(svc.meta.to_ref(), svc)
    }

    pub(crate) fn remove_service(&mut self, key: &ObjectRef) -> Option<Arc<Service>> {
        self.services.remove(key)
    }

    pub(crate) fn insert_endpoints(&mut self, ep: Arc<Endpoints>) -> Option<Arc<Endpoints>> {
        self.endpoints.insert(ep.meta.to_ref(), ep)
    }

    pub(crate) fn remove_endpoints(&mut self, key: &ObjectRef) -> Option<Arc<Endpoints>> {
        self.endpoints.remove(key)
    }

    pub(crate) fn insert_secret(&mut self, secret: Arc<Secret>) -> Option<Arc<Secret>> {
        self.secrets.insert(secret.meta.to_ref(), secret)
    }

    pub(crate) fn remove_secret(&mut self, key: &ObjectRef) -> Option<Arc<Secret>> {
        self.secrets.remove(key)
    }

    pub(crate) fn secrets(&self) -> &BTreeMap<ObjectRef, Arc<Secret>> {
        &self.secrets
    }

    /// Index an ingress, replacing any previous version.
    ///
    /// The prior version is removed from every host index it contributed
    /// to before the new hosts are indexed.
    pub(crate) fn insert_ingress(&mut self, ing: Arc<Ingress>) -> Option<Arc<Ingress>> {
        let key = ing.meta.to_ref();
        let old = self.remove_ingress(&key);
        for host in ingress_hosts(&ing) {
            self.vhost_ingresses
                .entry(host)
                .or_default()
                .insert(key.clone(), Arc::clone(&ing));
        }
        self.ingresses.insert(key, ing);
        old
    }

    pub(crate) fn remove_ingress(&mut self, key: &ObjectRef) -> Option<Arc<Ingress>> {
        let old = self.ingresses.remove(key)?;
        for host in ingress_hosts(&old) {
            if let Some(members) = self.vhost_ingresses.get_mut(&host) {
                members.remove(key);
                if members.is_empty() {
                    self.vhost_ingresses.remove(&host);
                }
            }
        }
        Some(old)
    }

    pub(crate) fn insert_route(&mut self, route: Arc<IngressRoute>) -> Option<Arc<IngressRoute>> {
        let key = route.meta.to_ref();
        let old = self.remove_route(&key);
        self.vhost_routes
            .entry(route_host(&route).to_string())
            .or_default()
            .insert(key.clone(), Arc::clone(&route));
        self.routes.insert(key, route);
        old
    }

    pub(crate) fn remove_route(&mut self, key: &ObjectRef) -> Option<Arc<IngressRoute>> {
        let old = self.routes.remove(key)?;
        let host = route_host(&old).to_string();
        if let Some(members) = self.vhost_routes.get_mut(&host) {
            members.remove(key);
            if members.is_empty() {
                self.vhost_routes.remove(&host);
            }
        }
        Some(old)
    }

    pub(crate) fn ingresses(&self) -> &BTreeMap<ObjectRef, Arc<Ingress>> {
        &self.ingresses
    }

    pub(crate) fn routes(&self) -> &BTreeMap<ObjectRef, Arc<IngressRoute>> {
        &self.routes
    }

    pub(crate) fn ingresses_for_host(
        &self,
        host: &str,
    ) -> Option<&BTreeMap<ObjectRef, Arc<Ingress>>> {
        self.vhost_ingresses.get(host)
    }

    pub(crate) fn routes_for_host(
        &self,
        host: &str,
    ) -> Option<&BTreeMap<ObjectRef, Arc<IngressRoute>>> {
        self.vhost_routes.get(host)
    }
}

/// The hosts an ingress contributes routes to.
pub(crate) fn ingress_hosts(ing: &Ingress) -> BTreeSet<String> {
    let mut hosts = BTreeSet::new();
    if ing.backend.is_some() {
        hosts.insert(WILDCARD_HOST.to_string());
    }
    for rule in &ing.rules {
        hosts.insert(
            rule.host
                .as_deref()
                .filter(|h| !h.is_empty())
                .unwrap_or(WILDCARD_HOST)
                .to_string(),
        );
    }
    hosts
}

/// The host an ingress route contributes routes to.
pub(crate) fn route_host(route: &IngressRoute) -> &str {
    route
        .virtual_host
        .as_ref()
        .map(|vh| vh.fqdn.as_str())
        .filter(|f| !f.is_empty())
        .unwrap_or(WILDCARD_HOST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use isobar_api::{HttpIngressPath, IngressBackend, IngressRule, ObjectMeta, PortRef};

    fn ingress(name: &str, hosts: &[Option<&str>]) -> Arc<Ingress> {
        Arc::new(Ingress {
            meta: ObjectMeta::new("default", name),
            backend: None,
            rules: hosts
                .iter()
                .map(|h| IngressRule {
                    host: h.map(str::to_string),
                    paths: vec![HttpIngressPath {
                        path: None,
                        backend: IngressBackend {
                            service_name: "kuard".to_string(),
                            service_port: PortRef::Number(80),
                        },
                    }],
                })
                .collect(),
            tls: vec![],
        })
    }

    #[test]
    fn host_index_follows_updates() {
        let mut cache = ObjectCache::new();
        let key = ObjectRef::new("default", "kuard");

        cache.insert_ingress(ingress("kuard", &[Some("a.example.com")]));
        assert!(cache.ingresses_for_host("a.example.com").is_some());

        // update moves the ingress to a different host
        cache.insert_ingress(ingress("kuard", &[Some("b.example.com")]));
        assert!(cache.ingresses_for_host("a.example.com").is_none());
        assert!(cache.ingresses_for_host("b.example.com").is_some());

        cache.remove_ingress(&key);
        assert!(cache.ingresses_for_host("b.example.com").is_none());
    }

    #[test]
    fn missing_host_indexes_under_wildcard() {
        let mut cache = ObjectCache::new();
        cache.insert_ingress(ingress("kuard", &[None]));
        assert!(cache.ingresses_for_host(WILDCARD_HOST).is_some());
    }

    #[test]
    fn default_backend_indexes_under_wildcard() {
        let ing = Arc::new(Ingress {
            meta: ObjectMeta::new("default", "simple"),
            backend: Some(IngressBackend {
                service_name: "backend".to_string(),
                service_port: PortRef::Number(80),
            }),
            rules: vec![],
            tls: vec![],
        });
        assert!(ingress_hosts(&ing).contains(WILDCARD_HOST));
    }

    #[test]
    fn two_ingresses_share_a_host() {
        let mut cache = ObjectCache::new();
        cache.insert_ingress(ingress("one", &[Some("shared.example.com")]));
        let mut other = ingress("two", &[Some("shared.example.com")]);
        Arc::make_mut(&mut other).meta = ObjectMeta::new("kube-system", "two");
        cache.insert_ingress(other);

        let members = cache.ingresses_for_host("shared.example.com").unwrap();
        assert_eq!(members.len(), 2);

        cache.remove_ingress(&ObjectRef::new("default", "one"));
        assert_eq!(cache.ingresses_for_host("shared.example.com").unwrap().len(), 1);
    }
}
