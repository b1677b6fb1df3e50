//! Settings with dirty tracking.
//!
//! A component keeps its configuration in a [`SettingsStore`]: a public
//! partition for user-facing options and a private partition for values the
//! component derives for itself. Writes never trigger side effects; the owner
//! reads the dirty set once per reconciliation pass and then calls
//! [`SettingsStore::clear_dirty`].
//!
//! Invariant: a key is dirty iff its current value differs from the value
//! committed by the last `clear_dirty`.

use std::collections::{BTreeMap, BTreeSet};

/// Values that animations can interpolate.
pub trait AnimatableValue: Clone + PartialEq {
    fn as_number(&self) -> Option<f64>;
    fn from_number(v: f64) -> Self;
}

impl AnimatableValue for f64 {
    fn as_number(&self) -> Option<f64> {
        Some(*self)
    }

    fn from_number(v: f64) -> Self {
        v
    }
}

/// One partition of a settings store.
#[derive(Debug, Clone)]
pub struct Settings<K, V> {
    current: BTreeMap<K, V>,
    previous: BTreeMap<K, V>,
    dirty: BTreeSet<K>,
}

impl<K, V> Default for Settings<K, V> {
    fn default() -> Self {
        Self {
            current: BTreeMap::new(),
            previous: BTreeMap::new(),
            dirty: BTreeSet::new(),
        }
    }
}

impl<K: Ord + Copy, V: Clone + PartialEq> Settings<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.current.get(&key)
    }

    pub fn get_or(&self, key: K, default: V) -> V {
        self.current.get(&key).cloned().unwrap_or(default)
    }

    /// The value committed by the last pass.
    pub fn previous(&self, key: K) -> Option<&V> {
        self.previous.get(&key)
    }

    /// Stores `value`; returns `true` if the key is dirty afterwards.
    pub fn set(&mut self, key: K, value: V) -> bool {
        self.current.insert(key, value);
        self.refresh_dirty(key)
    }

    /// Stores `value` without marking the key dirty.
    ///
    /// A clean key is committed along with the write. A key that is already
    /// dirty stays dirty so the pending change is still seen by this pass.
    pub fn set_raw(&mut self, key: K, value: V) {
        if !self.dirty.contains(&key) {
            self.previous.insert(key, value.clone());
        }
        self.current.insert(key, value);
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        let old = self.current.remove(&key);
        self.refresh_dirty(key);
        old
    }

    pub fn is_dirty(&self, key: K) -> bool {
        self.dirty.contains(&key)
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn change_set(&self) -> ChangeSet<K> {
        ChangeSet {
            keys: self.dirty.clone(),
        }
    }

    pub fn clear_dirty(&mut self) {
        // Non-dirty keys already match `previous`.
        for key in std::mem::take(&mut self.dirty) {
            match self.current.get(&key) {
                Some(v) => {
                    self.previous.insert(key, v.clone());
                }
                None => {
                    self.previous.remove(&key);
                }
            }
        }
    }

    fn refresh_dirty(&mut self, key: K) -> bool {
        if self.previous.get(&key) != self.current.get(&key) {
            self.dirty.insert(key);
            true
        } else {
            self.dirty.remove(&key);
            false
        }
    }
}

/// Snapshot of the keys that changed during one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet<K> {
    keys: BTreeSet<K>,
}

impl<K: Ord + Copy> ChangeSet<K> {
    pub fn contains(&self, key: K) -> bool {
        self.keys.contains(&key)
    }

    pub fn contains_any(&self, keys: &[K]) -> bool {
        keys.iter().any(|k| self.keys.contains(k))
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.keys.iter().copied()
    }
}

/// Public and private settings of one component.
#[derive(Debug, Clone)]
pub struct SettingsStore<K, P, V> {
    settings: Settings<K, V>,
    private: Settings<P, V>,
}

impl<K, P, V> Default for SettingsStore<K, P, V> {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            private: Settings::default(),
        }
    }
}

impl<K, P, V> SettingsStore<K, P, V>
where
    K: Ord + Copy,
    P: Ord + Copy,
    V: Clone + PartialEq,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.settings.get(key)
    }

    pub fn get_or(&self, key: K, default: V) -> V {
        self.settings.get_or(key, default)
    }

    pub fn set(&mut self, key: K, value: V) -> bool {
        self.settings.set(key, value)
    }

    pub fn set_raw(&mut self, key: K, value: V) {
        self.settings.set_raw(key, value)
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        self.settings.remove(key)
    }

    pub fn is_dirty(&self, key: K) -> bool {
        self.settings.is_dirty(key)
    }

    pub fn change_set(&self) -> ChangeSet<K> {
        self.settings.change_set()
    }

    pub fn get_private(&self, key: P) -> Option<&V> {
        self.private.get(key)
    }

    pub fn set_private(&mut self, key: P, value: V) -> bool {
        self.private.set(key, value)
    }

    pub fn set_private_raw(&mut self, key: P, value: V) {
        self.private.set_raw(key, value)
    }

    pub fn is_private_dirty(&self, key: P) -> bool {
        self.private.is_dirty(key)
    }

    pub fn private_change_set(&self) -> ChangeSet<P> {
        self.private.change_set()
    }

    pub fn has_dirty(&self) -> bool {
        self.settings.has_dirty() || self.private.has_dirty()
    }

    /// Commits both partitions. Called once per pass, after reconciliation.
    pub fn clear_dirty(&mut self) {
        self.settings.clear_dirty();
        self.private.clear_dirty();
    }
}

impl<K, P, V> SettingsStore<K, P, V>
where
    K: Ord + Copy,
    P: Ord + Copy,
    V: AnimatableValue,
{
    pub fn number(&self, key: K) -> Option<f64> {
        self.get(key).and_then(AnimatableValue::as_number)
    }

    pub fn number_or(&self, key: K, default: f64) -> f64 {
        self.number(key).unwrap_or(default)
    }

    pub fn private_number(&self, key: P) -> Option<f64> {
        self.get_private(key).and_then(AnimatableValue::as_number)
    }
}
