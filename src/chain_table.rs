//! ChainTable: separate-chaining hash map over a slot arena, with a global
//! insertion-order list threaded through every entry.

use crate::reentrancy::ReentryFlag;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

const DEFAULT_BUCKET_COUNT: usize = 13;
const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Construction-time configuration.
///
/// Out-of-range values are corrected, never rejected: a zero
/// `initial_buckets` falls back to 13, a `load_factor` that is not strictly
/// positive (including NaN) falls back to 0.75.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    /// Grow the bucket array automatically when the load threshold is
    /// exceeded. Manual [`ChainTable::rehash`] works either way.
    pub auto_grow: bool,
    /// Number of buckets to start with.
    pub initial_buckets: usize,
    /// Growth threshold: the ratio of occupied buckets to total buckets
    /// above which an insert grows the table first.
    pub load_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_grow: true,
            initial_buckets: DEFAULT_BUCKET_COUNT,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl Config {
    fn normalized(self) -> Self {
        Self {
            auto_grow: self.auto_grow,
            initial_buckets: if self.initial_buckets == 0 {
                DEFAULT_BUCKET_COUNT
            } else {
                self.initial_buckets
            },
            // `>` rather than `>=` so NaN also takes the fallback.
            load_factor: if self.load_factor > 0.0 {
                self.load_factor
            } else {
                DEFAULT_LOAD_FACTOR
            },
        }
    }
}

// Links are slot handles, never owning pointers; the arena owns every entry.
// Each entry is threaded through two lists at once: its bucket's chain and
// the global insertion-order list.
#[derive(Debug, Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64, // cached at insertion; K::hash is never called again
    bucket_prev: Option<DefaultKey>,
    bucket_next: Option<DefaultKey>,
    order_prev: Option<DefaultKey>,
    order_next: Option<DefaultKey>,
}

/// A hash map with separate chaining, stable slot storage, and snapshot
/// enumeration in most-recent-first insertion order.
///
/// Entries live in a [`SlotMap`] arena and are linked two ways: into their
/// bucket's doubly-linked chain (rebuilt on growth) and into one global
/// doubly-linked order list (never reordered). Growth multiplies the bucket
/// count by two plus one whenever the fraction of *occupied* buckets exceeds
/// the configured load factor.
///
/// # Examples
///
/// ```
/// use chain_table::ChainTable;
///
/// let mut table = ChainTable::new();
/// table.insert("a", 1, true);
/// table.insert("b", 2, true);
/// assert_eq!(table.get(&"a"), Some(&1));
/// assert_eq!(table.all_keys(), vec!["b", "a"]); // newest first
/// ```
pub struct ChainTable<K, V, S = RandomState> {
    hasher: S,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
    buckets: Vec<Option<DefaultKey>>, // heads; buckets.len() >= 1 always
    head: Option<DefaultKey>,         // order-list head: most recent entry
    occupied: usize,
    auto_grow: bool,
    load_factor: f64,
    reentrancy: ReentryFlag,
}

impl<K, V> ChainTable<K, V>
where
    K: Eq + Hash,
{
    /// Creates a table with default configuration (auto-grow, 13 buckets,
    /// load factor 0.75) and a random hasher.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a table with the given configuration and a random hasher.
    pub fn with_config(config: Config) -> Self {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V, S> ChainTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Creates a table with default configuration and the given hasher.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(Config::default(), hasher)
    }

    /// Creates a table with the given configuration and hasher. The
    /// configuration is normalized per [`Config`]; construction never fails.
    pub fn with_config_and_hasher(config: Config, hasher: S) -> Self {
        let config = config.normalized();
        Self {
            hasher,
            slots: SlotMap::with_key(),
            buckets: vec![None; config.initial_buckets],
            head: None,
            occupied: 0,
            auto_grow: config.auto_grow,
            load_factor: config.load_factor,
            reentrancy: ReentryFlag::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    // Scans one bucket chain. A chain holds exactly the entries whose key
    // hashes to its bucket under the current bucket count, so the scan is
    // bounded by construction. Cached hash is compared before Eq.
    fn find_slot<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let mut cur = self.buckets[self.bucket_of(hash)];
        while let Some(k) = cur {
            let e = &self.slots[k];
            if e.hash == hash && e.key.borrow() == q {
                return Some(k);
            }
            cur = e.bucket_next;
        }
        None
    }

    /// Returns a reference to the value stored for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let k = self.find_slot(key)?;
        Some(&self.slots[k].value)
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let k = self.find_slot(key)?;
        Some(&mut self.slots[k].value)
    }

    /// Returns true if the table holds an entry for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        self.find_slot(key).is_some()
    }

    /// Inserts `key -> value`.
    ///
    /// Returns `true` only when an existing entry's value was replaced.
    /// Returns `false` when a new entry was created, or when the key was
    /// already present and `replace_existing` is `false` (the table is left
    /// untouched in that case).
    ///
    /// New entries are spliced at the front of their bucket chain and at the
    /// front of the global order list, which is what makes enumeration
    /// most-recent-first. A replacing insert overwrites the value in place
    /// and does not move the entry in either list.
    ///
    /// With auto-grow enabled, the bucket array grows first whenever
    /// `occupied_buckets / bucket_count` exceeds the load factor.
    pub fn insert(&mut self, key: K, value: V, replace_existing: bool) -> bool {
        if self.auto_grow
            && self.occupied as f64 / self.buckets.len() as f64 > self.load_factor
        {
            self.grow_buckets();
        }

        let _g = self.reentrancy.enter();
        let hash = self.make_hash(&key);
        let idx = self.bucket_of(hash);

        let mut cur = self.buckets[idx];
        while let Some(k) = cur {
            let e = &self.slots[k];
            if e.hash == hash && e.key == key {
                if replace_existing {
                    self.slots[k].value = value;
                    return true;
                }
                return false;
            }
            cur = e.bucket_next;
        }

        let bucket_head = self.buckets[idx];
        let order_head = self.head;
        let k = self.slots.insert(Entry {
            key,
            value,
            hash,
            bucket_prev: None,
            bucket_next: bucket_head,
            order_prev: None,
            order_next: order_head,
        });
        match bucket_head {
            Some(h) => self.slots[h].bucket_prev = Some(k),
            None => self.occupied += 1,
        }
        self.buckets[idx] = Some(k);
        if let Some(h) = order_head {
            self.slots[h].order_prev = Some(k);
        }
        self.head = Some(k);
        false
    }

    /// Removes the entry for `key`, returning its value.
    ///
    /// Returns `None` (and changes nothing) when the key is absent. Removal
    /// never shrinks the bucket array.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let k = self.find_slot(key)?;
        let entry = self.slots.remove(k)?;

        // Unsplice from the bucket chain, fixing the head and the occupied
        // count when the bucket empties.
        match entry.bucket_prev {
            Some(p) => self.slots[p].bucket_next = entry.bucket_next,
            None => {
                let idx = self.bucket_of(entry.hash);
                self.buckets[idx] = entry.bucket_next;
                if entry.bucket_next.is_none() {
                    self.occupied -= 1;
                }
            }
        }
        if let Some(n) = entry.bucket_next {
            self.slots[n].bucket_prev = entry.bucket_prev;
        }

        // Unsplice from the global order list.
        match entry.order_prev {
            Some(p) => self.slots[p].order_next = entry.order_next,
            None => self.head = entry.order_next,
        }
        if let Some(n) = entry.order_next {
            self.slots[n].order_prev = entry.order_prev;
        }

        Some(entry.value)
    }

    /// Rebuilds the bucket array at `bucket_count * 2 + 1` and re-links every
    /// entry into its new chain.
    ///
    /// One walk of the global order list; no entry is allocated, moved, or
    /// dropped, and `order_prev`/`order_next` are untouched, so enumeration
    /// order is preserved exactly. Only cached hashes are read, so no key
    /// code runs mid-rebuild. Available whether or not auto-grow is enabled.
    pub fn rehash(&mut self) {
        self.grow_buckets();
    }

    fn grow_buckets(&mut self) {
        let new_count = self.buckets.len() * 2 + 1;
        self.buckets.clear();
        self.buckets.resize(new_count, None);
        self.occupied = 0;

        // Every key hashed to the same bucket still shares a chain; the walk
        // is newest-first and prepends, which no API surface can observe.
        let mut cur = self.head;
        while let Some(k) = cur {
            let idx = self.bucket_of(self.slots[k].hash);
            let bucket_head = self.buckets[idx];
            let e = &mut self.slots[k];
            e.bucket_prev = None;
            e.bucket_next = bucket_head;
            cur = e.order_next;
            match bucket_head {
                Some(h) => self.slots[h].bucket_prev = Some(k),
                None => self.occupied += 1,
            }
            self.buckets[idx] = Some(k);
        }
    }
}

impl<K, V, S> ChainTable<K, V, S> {
    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current size of the bucket array. Read-only diagnostics; grows by
    /// `old * 2 + 1` steps and never shrinks.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of buckets holding at least one entry. The growth trigger
    /// compares this (not the entry count) against the bucket count.
    pub fn occupied_buckets(&self) -> usize {
        self.occupied
    }

    /// Iterates over `(&K, &V)` pairs in most-recent-first insertion order.
    ///
    /// Replacing an existing key's value does not move it; removing and
    /// re-inserting does.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            cur: self.head,
            remaining: self.slots.len(),
        }
    }

    /// Returns an owned snapshot of every key, most recent first. The
    /// snapshot stays valid across later table mutation.
    pub fn all_keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Returns an owned snapshot of every value, most recent first.
    pub fn all_values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.iter().map(|(_, v)| v.clone()).collect()
    }
}

/// Iterator over a table's entries in most-recent-first insertion order.
pub struct Iter<'a, K, V> {
    slots: &'a SlotMap<DefaultKey, Entry<K, V>>,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let e = &self.slots[k];
        self.cur = e.order_next;
        self.remaining -= 1;
        Some((&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a ChainTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, V, S> Default for ChainTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_config_and_hasher(Config::default(), S::default())
    }
}

impl<K, V, S> fmt::Debug for ChainTable<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Clone for ChainTable<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        // SlotMap::clone keeps every key, so all links stay valid verbatim.
        Self {
            hasher: self.hasher.clone(),
            slots: self.slots.clone(),
            buckets: self.buckets.clone(),
            head: self.head,
            occupied: self.occupied,
            auto_grow: self.auto_grow,
            load_factor: self.load_factor,
            reentrancy: ReentryFlag::new(),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for ChainTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v, true);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

#[cfg(test)]
impl<K, V, S> ChainTable<K, V, S> {
    // Cross-checks all three views of the entry set: bucket chains, the
    // global order list, and the slot arena.
    pub(crate) fn assert_invariants(&self) {
        use std::collections::HashSet;

        assert!(!self.buckets.is_empty());
        assert!(self.occupied <= self.buckets.len());

        // The order list is doubly linked and visits every slot exactly once.
        let mut order_seen = HashSet::new();
        let mut prev = None;
        let mut cur = self.head;
        while let Some(k) = cur {
            let e = &self.slots[k];
            assert_eq!(e.order_prev, prev);
            assert!(order_seen.insert(k), "slot appears twice in order list");
            prev = cur;
            cur = e.order_next;
        }
        assert_eq!(order_seen.len(), self.slots.len());

        // Bucket chains are doubly linked, disjoint, hold only entries that
        // hash to their bucket, and together cover every slot.
        let mut chain_seen = HashSet::new();
        let mut occupied = 0;
        for (idx, &bucket_head) in self.buckets.iter().enumerate() {
            if bucket_head.is_some() {
                occupied += 1;
            }
            let mut prev = None;
            let mut cur = bucket_head;
            while let Some(k) = cur {
                let e = &self.slots[k];
                assert_eq!(e.bucket_prev, prev);
                assert_eq!((e.hash % self.buckets.len() as u64) as usize, idx);
                assert!(chain_seen.insert(k), "slot appears twice across chains");
                prev = cur;
                cur = e.bucket_next;
            }
        }
        assert_eq!(chain_seen.len(), self.slots.len());
        assert_eq!(occupied, self.occupied);
    }
}
