//! Monotone version source for resource caches.

use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing version counter.
///
/// Each resource cache renders its counter as a decimal string to produce
/// the `version_info` carried by discovery responses. The counter advances
/// on every cache mutation, so two observers comparing version strings can
/// order the states they saw.
#[derive(Debug, Default)]
pub struct VersionCounter(AtomicU64);

impl VersionCounter {
    /// Create a counter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter, returning the new value.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get the current value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Render the current value as a decimal version string.
    #[must_use]
    pub fn render(&self) -> String {
        self.value().to_string()
    }
}
