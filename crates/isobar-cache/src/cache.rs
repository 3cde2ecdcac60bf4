//! The generic resource cache.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use isobar_core::VersionCounter;
use isobar_types::Resource;
use tokio::sync::watch;
use tracing::trace;

/// Version counter plus change broadcast, shared by one or more caches.
#[derive(Debug)]
pub(crate) struct Signal {
    versions: VersionCounter,
    tx: watch::Sender<u64>,
}

impl Signal {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            versions: VersionCounter::new(),
            tx,
        }
    }

    /// Advance the version and wake observers.
    pub(crate) fn bump(&self) {
        let v = self.versions.advance();
        // send_replace wakes receivers even when no receiver is registered yet
        self.tx.send_replace(v);
    }

    /// Wake observers at the current version.
    pub(crate) fn notify(&self) {
        self.tx.send_replace(self.versions.value());
    }

    pub(crate) fn version(&self) -> String {
        self.versions.render()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

/// A versioned, name-indexed collection of one resource type.
///
/// Entries are kept ordered by name, so [`contents`](Self::contents) is a
/// deterministic snapshot. Writers hold the exclusive side of a `RwLock`
/// only while mutating the map; the version bump and observer wake-up
/// happen after the lock is released, so readers are never blocked on
/// notification.
#[derive(Debug)]
pub struct ResourceCache<T> {
    entries: RwLock<BTreeMap<String, T>>,
    signal: Arc<Signal>,
}

impl<T: Resource + Clone + PartialEq> Default for ResourceCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource + Clone + PartialEq> ResourceCache<T> {
    /// Create an empty cache with its own version counter.
    #[must_use]
    pub fn new() -> Self {
        Self::with_signal(Arc::new(Signal::new()))
    }

    /// Create an empty cache sharing an existing signal.
    pub(crate) fn with_signal(signal: Arc<Signal>) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            signal,
        }
    }

    /// Insert or replace entries by name.
    ///
    /// Replacing an entry with an equal one is not a mutation: the version
    /// only advances when contents actually change.
    pub fn add<I>(&self, entries: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut changed = false;
        {
            let mut map = self.entries.write().expect("cache lock poisoned");
            for entry in entries {
                let name = entry.name().to_string();
                match map.get(&name) {
                    Some(existing) if *existing == entry => {}
                    _ => {
                        map.insert(name, entry);
                        changed = true;
                    }
                }
            }
        }
        if changed {
            self.signal.bump();
            trace!(version = %self.signal.version(), "cache updated");
        }
    }

    /// Remove entries by name. Unknown names are ignored.
    pub fn remove<I, N>(&self, names: I)
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let mut changed = false;
        {
            let mut map = self.entries.write().expect("cache lock poisoned");
            for name in names {
                if map.remove(name.as_ref()).is_some() {
                    changed = true;
                }
            }
        }
        if changed {
            self.signal.bump();
            trace!(version = %self.signal.version(), "cache updated");
        }
    }

    /// An ordered snapshot of the current entries.
    #[must_use]
    pub fn contents(&self) -> Vec<T> {
        let map = self.entries.read().expect("cache lock poisoned");
        map.values().cloned().collect()
    }

    /// An ordered snapshot together with the version it was taken at.
    #[must_use]
    pub fn snapshot(&self) -> (String, Vec<T>) {
        let map = self.entries.read().expect("cache lock poisoned");
        (self.signal.version(), map.values().cloned().collect())
    }

    /// The current version, as a decimal string.
    #[must_use]
    pub fn version(&self) -> String {
        self.signal.version()
    }

    /// Subscribe to the change signal.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.signal.subscribe()
    }

    /// Wake observers at the current version without bumping it.
    pub fn notify(&self) {
        self.signal.notify();
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    /// Whether the cache has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isobar_types::cluster::Cluster;

    fn cluster(name: &str, service_name: &str) -> Cluster {
        Cluster {
            name: name.to_string(),
            eds_cluster_config: Some(isobar_types::cluster::cluster::EdsClusterConfig {
                eds_config: None,
                service_name: service_name.to_string(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn add_replaces_by_name() {
        let cache = ResourceCache::<Cluster>::new();
        cache.add([cluster("default/kuard/80", "default/kuard")]);
        cache.add([cluster("default/kuard/80", "default/kuard/http")]);

        let contents = cache.contents();
        assert_eq!(contents.len(), 1);
        assert_eq!(
            contents[0].eds_cluster_config.as_ref().unwrap().service_name,
            "default/kuard/http"
        );
    }

    #[test]
    fn version_advances_only_on_change() {
        let cache = ResourceCache::<Cluster>::new();
        assert_eq!(cache.version(), "0");

        cache.add([cluster("a", "a")]);
        assert_eq!(cache.version(), "1");

        // identical re-add: no mutation, no bump
        cache.add([cluster("a", "a")]);
        assert_eq!(cache.version(), "1");

        cache.remove(["a"]);
        assert_eq!(cache.version(), "2");

        // removing an unknown name is tolerated and is not a mutation
        cache.remove(["a"]);
        assert_eq!(cache.version(), "2");
    }

    #[test]
    fn contents_are_ordered_by_name() {
        let cache = ResourceCache::<Cluster>::new();
        cache.add([cluster("b", "b"), cluster("a", "a"), cluster("c", "c")]);
        let names: Vec<_> = cache.contents().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn observers_coalesce_to_newest_version() {
        let cache = ResourceCache::<Cluster>::new();
        let mut rx = cache.subscribe();

        // several writes land while the observer is away
        cache.add([cluster("a", "a")]);
        cache.add([cluster("b", "b")]);
        cache.add([cluster("c", "c")]);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 3);
        // no stale intermediate wake-ups remain
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn notify_wakes_without_bumping() {
        let cache = ResourceCache::<Cluster>::new();
        let mut rx = cache.subscribe();

        cache.notify();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 0);
        assert_eq!(cache.version(), "0");
    }

    #[test]
    fn snapshot_pairs_version_and_contents() {
        let cache = ResourceCache::<Cluster>::new();
        cache.add([cluster("a", "a")]);
        let (version, contents) = cache.snapshot();
        assert_eq!(version, "1");
        assert_eq!(contents.len(), 1);
    }
}
