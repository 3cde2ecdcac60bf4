//! # isobar-translate
//!
//! The translation pipeline: cluster events in, proxy configuration out.
//!
//! Events flow through three stages:
//!
//! 1. The [`Buffer`] serializes concurrent add/update/delete callbacks onto
//!    a single consumer task.
//! 2. The [`Translator`] keeps the latest version of every observed object
//!    and recomputes the derived configuration touched by each event.
//! 3. The resource caches (`isobar-cache`) hold the derived clusters,
//!    endpoint assignments, listeners, and virtual hosts, and wake the
//!    discovery streams watching them.
//!
//! Translation is deterministic: the cache contents are a pure function of
//! the current object set, never of event history.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod annotations;
mod buffer;
mod cluster;
mod config;
mod endpoints;
mod hashname;
mod listener;
mod object_cache;
mod translator;
mod vhost;

pub use buffer::{Buffer, EventHandler, DEFAULT_EVENT_BUFFER_CAPACITY};
pub use config::{TranslatorConfig, DEFAULT_INGRESS_CLASS};
pub use hashname::hashname;
pub use translator::Translator;
