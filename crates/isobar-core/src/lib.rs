//! # isobar-core
//!
//! Core types shared by the isobar control plane crates:
//!
//! - [`Error`] - error type with gRPC status code mapping
//! - [`VersionCounter`] - monotone version source for resource caches
//! - [`WorkerGroup`] - cooperative supervisor for long-running tasks
//!
//! ## Example
//!
//! ```rust
//! use isobar_core::VersionCounter;
//!
//! let versions = VersionCounter::new();
//! assert_eq!(versions.render(), "0");
//! versions.advance();
//! assert_eq!(versions.render(), "1");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod version;
mod workgroup;

pub use error::Error;
pub use version::VersionCounter;
pub use workgroup::WorkerGroup;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
