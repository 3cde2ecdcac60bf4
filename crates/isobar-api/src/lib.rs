//! # isobar-api
//!
//! The input side of the isobar control plane: the routing objects the
//! cluster orchestrator notifies us about. Objects are plain data; all
//! behavior lives in the translator.
//!
//! Every object carries an [`ObjectMeta`] identifying it by namespace and
//! name and holding its string annotations. The inbound event payload is
//! [`Object`], a sum over the five object kinds plus a tombstone wrapper
//! for deletions observed late.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod meta;
mod objects;

pub use meta::{ObjectMeta, ObjectRef};
pub use objects::{
    Endpoints, EndpointPort, EndpointSubset, HttpIngressPath, Ingress, IngressBackend,
    IngressRoute, IngressRule, IngressTls, Object, PortRef, RouteService, RouteSpec,
    RouteTls, RouteVirtualHost, Secret, Service, ServicePort, TLS_CERT_KEY,
    TLS_PRIVATE_KEY_KEY,
};
