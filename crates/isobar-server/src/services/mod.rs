//! The four per-resource-type discovery sources.
//!
//! Each source adapts one resource cache to the
//! [`DiscoverySource`](crate::discovery::DiscoverySource) contract
//! consumed by the generic discovery service:
//!
//! - CDS: clusters
//! - EDS: endpoint assignments
//! - LDS: listeners
//! - RDS: route configurations, assembled from the virtual-host tables

mod cds;
mod eds;
mod lds;
mod rds;

pub use cds::ClusterSource;
pub use eds::EndpointSource;
pub use lds::ListenerSource;
pub use rds::RouteSource;
