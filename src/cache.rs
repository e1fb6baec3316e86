//! Memo cache for resolved feature configurations.
//!
//! Selection is pure, so the cache only exists to avoid recomputing the
//! fixpoint for every action; concurrent callers may race to compute the
//! same key and the last insert wins. Collision errors are never cached.

use std::sync::Arc;

use parking_lot::Mutex;
use util::HashMap;

use crate::config::FeatureConfiguration;

/// Bounded map from a sorted requested-name set to its resolved
/// configuration, with least-recently-used eviction.
#[derive(Debug)]
pub(crate) struct ConfigCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

#[derive(Debug)]
struct Inner {
    map: HashMap<Vec<String>, Entry>,
    tick: u64,
}

#[derive(Debug)]
struct Entry {
    stamp: u64,
    config: Arc<FeatureConfiguration>,
}

impl ConfigCache {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be nonzero");
        Self {
            inner: Mutex::new(Inner {
                map: HashMap::default(),
                tick: 0,
            }),
            capacity,
        }
    }

    pub(crate) fn get(&self, key: &[String]) -> Option<Arc<FeatureConfiguration>> {
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;
        let entry = inner.map.get_mut(key)?;
        entry.stamp = tick;
        Some(entry.config.clone())
    }

    pub(crate) fn insert(&self, key: Vec<String>, config: Arc<FeatureConfiguration>) {
        let mut inner = self.inner.lock();
        if inner.map.len() >= self.capacity && !inner.map.contains_key(&key) {
            let oldest = inner
                .map
                .iter()
                .min_by_key(|(_, entry)| entry.stamp)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                log::trace!("configuration cache full, evicting {oldest:?}");
                inner.map.remove(&oldest);
            }
        }
        inner.tick += 1;
        let stamp = inner.tick;
        inner.map.insert(key, Entry { stamp, config });
    }
}
