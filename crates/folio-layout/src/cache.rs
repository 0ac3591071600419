//! Bounded cache of rendered spreads, evicted least-recently-used first.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tokio::sync::Notify;
use tracing::debug;

use crate::book::RenderSource;
use crate::frame::Frame;

/// Cache key of a spread, displayed as `spread-<index>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpreadKey(pub usize);

impl fmt::Display for SpreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spread-{}", self.0)
    }
}

/// Frames of one rendered spread.
#[derive(Clone, Debug, Default)]
pub struct PrerenderedSpread {
    pub left: Option<Rc<Frame>>,
    pub right: Option<Rc<Frame>>,
    pub center: Option<Rc<Frame>>,
}

impl PrerenderedSpread {
    pub fn center(frame: Frame) -> Self {
        Self {
            center: Some(Rc::new(frame)),
            ..Default::default()
        }
    }

    pub fn pair(left: Frame, right: Frame) -> Self {
        Self {
            left: Some(Rc::new(left)),
            right: Some(Rc::new(right)),
            center: None,
        }
    }

    pub fn frames(&self) -> impl Iterator<Item = &Rc<Frame>> {
        self.left.iter().chain(self.right.iter()).chain(self.center.iter())
    }

    pub fn release(&self) {
        for frame in self.frames() {
            frame.release();
        }
    }
}

/// Section sources a spread was rendered from.
#[derive(Clone, Debug, Default)]
pub struct SpreadSources {
    pub left: Option<RenderSource>,
    pub right: Option<RenderSource>,
    pub center: Option<RenderSource>,
}

/// Rendered spreads, in-flight preload markers, and when each spread was last used.
///
/// A key is absent, loading (a marker is present) or ready (frames are held).
/// Access time is a tick that increases on every touch, so ordering is total
/// even when several touches happen within the same instant.
#[derive(Debug, Default)]
pub struct SpreadCache {
    prerendered: HashMap<SpreadKey, PrerenderedSpread>,
    loading: HashMap<SpreadKey, Rc<Notify>>,
    access: HashMap<SpreadKey, u64>,
    tick: u64,
}

impl SpreadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rendered spreads held.
    pub fn len(&self) -> usize {
        self.prerendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prerendered.is_empty()
    }

    pub fn contains(&self, key: SpreadKey) -> bool {
        self.prerendered.contains_key(&key)
    }

    pub fn get(&self, key: SpreadKey) -> Option<PrerenderedSpread> {
        self.prerendered.get(&key).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = SpreadKey> + '_ {
        self.prerendered.keys().copied()
    }

    /// Record an access to `key`.
    pub fn touch(&mut self, key: SpreadKey) {
        self.tick += 1;
        self.access.insert(key, self.tick);
    }

    pub fn last_access(&self, key: SpreadKey) -> Option<u64> {
        self.access.get(&key).copied()
    }

    /// Store a rendered spread and touch it.
    pub fn insert(&mut self, key: SpreadKey, spread: PrerenderedSpread) {
        if let Some(previous) = self.prerendered.insert(key, spread) {
            previous.release();
        }
        self.touch(key);
    }

    /// Notifier of the in-flight preload for `key`, if there is one.
    pub fn loading(&self, key: SpreadKey) -> Option<Rc<Notify>> {
        self.loading.get(&key).cloned()
    }

    /// Occupy `key` with a loading marker.
    pub fn mark_loading(&mut self, key: SpreadKey) -> Rc<Notify> {
        let notify = Rc::new(Notify::new());
        self.loading.insert(key, notify.clone());
        notify
    }

    /// Drop the loading marker `notify` put on `key`, if it is still there.
    pub fn abandon_loading(&mut self, key: SpreadKey, notify: &Rc<Notify>) {
        if self.loading.get(&key).is_some_and(|n| Rc::ptr_eq(n, notify)) {
            self.loading.remove(&key);
        }
    }

    /// Forget `key` entirely, releasing its frames.
    pub fn remove(&mut self, key: SpreadKey) {
        if let Some(spread) = self.prerendered.remove(&key) {
            spread.release();
        }
        self.loading.remove(&key);
        self.access.remove(&key);
    }

    /// Evict least-recently-used spreads until at most `max` remain.
    ///
    /// Keys in `protect` are never evicted, so more than `max` may remain when
    /// it is larger than `max`. Returns the evicted keys, oldest first.
    pub fn prune(&mut self, max: usize, protect: &[SpreadKey]) -> Vec<SpreadKey> {
        if self.prerendered.len() <= max {
            return Vec::new();
        }
        let mut by_age: Vec<(u64, SpreadKey)> = self
            .prerendered
            .keys()
            .filter(|key| !protect.contains(key))
            .map(|key| (self.access.get(key).copied().unwrap_or(0), *key))
            .collect();
        by_age.sort();

        let excess = self.prerendered.len() - max;
        let evicted: Vec<SpreadKey> = by_age.into_iter().take(excess).map(|(_, key)| key).collect();
        for key in &evicted {
            debug!(%key, "evicting prerendered spread");
            self.remove(*key);
        }
        evicted
    }

    /// Release and forget everything.
    pub fn clear(&mut self) {
        for spread in self.prerendered.values() {
            spread.release();
        }
        self.prerendered.clear();
        self.loading.clear();
        self.access.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display() {
        assert_eq!(SpreadKey(3).to_string(), "spread-3");
    }

    #[test]
    fn evicts_least_recently_accessed() {
        let mut cache = SpreadCache::new();
        let (a, b, c, d) = (SpreadKey(0), SpreadKey(1), SpreadKey(2), SpreadKey(3));
        cache.insert(a, PrerenderedSpread::default());
        cache.insert(b, PrerenderedSpread::default());
        cache.insert(c, PrerenderedSpread::default());
        assert_eq!(cache.prune(2, &[]), vec![a]);

        cache.touch(b);
        cache.insert(d, PrerenderedSpread::default());
        assert_eq!(cache.prune(2, &[]), vec![c]);
        let mut left: Vec<_> = cache.keys().collect();
        left.sort();
        assert_eq!(left, vec![b, d]);
        assert_eq!(cache.last_access(a), None);
    }

    #[test]
    fn protected_key_survives_pruning() {
        let mut cache = SpreadCache::new();
        cache.insert(SpreadKey(0), PrerenderedSpread::default());
        cache.insert(SpreadKey(1), PrerenderedSpread::default());
        assert_eq!(cache.prune(1, &[SpreadKey(0)]), vec![SpreadKey(1)]);
        assert!(cache.contains(SpreadKey(0)));
    }

    #[test]
    fn protection_can_exceed_the_bound() {
        let mut cache = SpreadCache::new();
        for i in 0..4 {
            cache.insert(SpreadKey(i), PrerenderedSpread::default());
        }
        let protect = [SpreadKey(1), SpreadKey(2), SpreadKey(3)];
        assert_eq!(cache.prune(1, &protect), vec![SpreadKey(0)]);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn loading_markers_follow_the_key_lifecycle() {
        let mut cache = SpreadCache::new();
        let key = SpreadKey(5);
        assert!(cache.loading(key).is_none());
        let first = cache.mark_loading(key);
        let second = cache.mark_loading(key);
        cache.abandon_loading(key, &first);
        assert!(cache.loading(key).is_some(), "a newer marker is left alone");
        cache.abandon_loading(key, &second);
        assert!(cache.loading(key).is_none());

        cache.mark_loading(key);
        cache.insert(key, PrerenderedSpread::default());
        assert!(cache.contains(key));
        cache.remove(key);
        assert!(cache.loading(key).is_none());
        assert!(!cache.contains(key));
    }

    #[test]
    fn untouched_keys_are_oldest() {
        let mut cache = SpreadCache::new();
        cache.insert(SpreadKey(1), PrerenderedSpread::default());
        cache.prerendered.insert(SpreadKey(9), PrerenderedSpread::default());
        assert_eq!(cache.prune(1, &[]), vec![SpreadKey(9)]);
    }
}
