//! The five input object kinds and the inbound event payload.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ObjectMeta;

/// Secret data key holding the PEM certificate chain.
pub const TLS_CERT_KEY: &str = "tls.crt";
/// Secret data key holding the PEM private key.
pub const TLS_PRIVATE_KEY_KEY: &str = "tls.key";

/// A set of named ports fronting a workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Object identity.
    pub meta: ObjectMeta,
    /// The service's ports.
    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

/// One port of a [`Service`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePort {
    /// Port name; required when the service has several ports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Port number exposed by the service.
    pub port: u32,
    /// Port the workload actually listens on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u32>,
}

/// The ready addresses backing a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Object identity; shares (namespace, name) with its service.
    pub meta: ObjectMeta,
    /// Address groups.
    #[serde(default)]
    pub subsets: Vec<EndpointSubset>,
}

/// A group of addresses sharing a port list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSubset {
    /// Ready addresses.
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Ports every address in the group serves.
    #[serde(default)]
    pub ports: Vec<EndpointPort>,
}

/// One port of an [`EndpointSubset`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPort {
    /// Port name; matches the service port name when that is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Port number.
    pub port: u32,
}

/// An opaque byte map, of interest for TLS material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    /// Object identity.
    pub meta: ObjectMeta,
    /// Entries keyed by well-known names.
    #[serde(default)]
    pub data: BTreeMap<String, Vec<u8>>,
}

impl Secret {
    /// The PEM certificate chain, if present.
    #[must_use]
    pub fn tls_certificate(&self) -> Option<&[u8]> {
        self.data.get(TLS_CERT_KEY).map(Vec::as_slice)
    }

    /// The PEM private key, if present.
    #[must_use]
    pub fn tls_private_key(&self) -> Option<&[u8]> {
        self.data.get(TLS_PRIVATE_KEY_KEY).map(Vec::as_slice)
    }

    /// Whether the secret holds a full keypair.
    #[must_use]
    pub fn has_keypair(&self) -> bool {
        self.tls_certificate().is_some() && self.tls_private_key().is_some()
    }
}

/// Declarative routing from hostnames and paths to backend services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingress {
    /// Object identity.
    pub meta: ObjectMeta,
    /// Backend receiving traffic matched by no rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<IngressBackend>,
    /// Host- and path-scoped routing rules.
    #[serde(default)]
    pub rules: Vec<IngressRule>,
    /// TLS termination specs.
    #[serde(default)]
    pub tls: Vec<IngressTls>,
}

/// A service and port receiving traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressBackend {
    /// Target service name, in the ingress's namespace.
    pub service_name: String,
    /// Target service port.
    pub service_port: PortRef,
}

/// A service port identified by number or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortRef {
    /// By port number.
    Number(u32),
    /// By port name.
    Name(String),
}

impl Default for PortRef {
    fn default() -> Self {
        PortRef::Number(0)
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortRef::Number(n) => write!(f, "{n}"),
            PortRef::Name(s) => write!(f, "{s}"),
        }
    }
}

/// One rule of an [`Ingress`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    /// Host this rule applies to; unset routes all hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Path-to-backend mappings.
    #[serde(default)]
    pub paths: Vec<HttpIngressPath>,
}

/// One path mapping of an [`IngressRule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpIngressPath {
    /// Matched path; unset matches everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Backend receiving the matched traffic.
    pub backend: IngressBackend,
}

/// A TLS termination spec of an [`Ingress`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressTls {
    /// Hosts covered by the certificate.
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Secret holding the keypair, in the ingress's namespace.
    #[serde(default)]
    pub secret_name: String,
}

/// Extended routing object with weighted multi-backend routes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRoute {
    /// Object identity.
    pub meta: ObjectMeta,
    /// The virtual host this object describes; unset routes all hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_host: Option<RouteVirtualHost>,
    /// The routes.
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

/// The virtual-host block of an [`IngressRoute`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteVirtualHost {
    /// Fully-qualified domain name of the host.
    pub fqdn: String,
    /// TLS termination for this host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<RouteTls>,
}

/// TLS termination of a [`RouteVirtualHost`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTls {
    /// Secret holding the keypair, in the route's namespace.
    pub secret_name: String,
}

/// One route of an [`IngressRoute`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Matched path prefix (or regex when it carries metacharacters).
    #[serde(rename = "match")]
    pub path_match: String,
    /// Backend services sharing the matched traffic.
    #[serde(default)]
    pub services: Vec<RouteService>,
}

/// One backend of a [`RouteSpec`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteService {
    /// Service name, in the route's namespace.
    pub name: String,
    /// Service port number.
    pub port: u32,
    /// Relative weight out of 100; unset weights share the remainder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

/// An inbound event payload: one of the five object kinds, or a tombstone
/// wrapping one observed after the fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    /// A service.
    Service(Arc<Service>),
    /// A service's endpoints.
    Endpoints(Arc<Endpoints>),
    /// A secret.
    Secret(Arc<Secret>),
    /// An ingress.
    Ingress(Arc<Ingress>),
    /// An ingress route.
    IngressRoute(Arc<IngressRoute>),
    /// A deletion observed late; unwrap and handle the inner object.
    Tombstone(Box<Object>),
}

impl Object {
    /// The object's kind, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Object::Service(_) => "Service",
            Object::Endpoints(_) => "Endpoints",
            Object::Secret(_) => "Secret",
            Object::Ingress(_) => "Ingress",
            Object::IngressRoute(_) => "IngressRoute",
            Object::Tombstone(inner) => inner.kind(),
        }
    }

    /// The object's metadata, through any tombstone wrapping.
    #[must_use]
    pub fn meta(&self) -> &ObjectMeta {
        match self {
            Object::Service(o) => &o.meta,
            Object::Endpoints(o) => &o.meta,
            Object::Secret(o) => &o.meta,
            Object::Ingress(o) => &o.meta,
            Object::IngressRoute(o) => &o.meta,
            Object::Tombstone(inner) => inner.meta(),
        }
    }

    /// Strip tombstone wrappers, yielding the wrapped object.
    #[must_use]
    pub fn unwrap_tombstone(self) -> Object {
        match self {
            Object::Tombstone(inner) => inner.unwrap_tombstone(),
            other => other,
        }
    }
}
