// ChainTable integration test suite (consolidated).
//
// Each test documents what behavior is being verified and which invariants
// are assumed or asserted. The core invariants exercised:
// - Uniqueness: at most one entry per key, whatever the insert sequence.
// - Size consistency: len() equals what a full enumeration yields.
// - Order: enumeration is most-recent-first; replacement keeps position.
// - Growth: bucket_count steps by old * 2 + 1, triggered by occupied
//   buckets exceeding the load factor, and only with auto-grow enabled.
// - Rehash transparency: content, lookups, and order are unchanged.
// - Leniency: invalid construction parameters correct to defaults.
use chain_table::{ChainTable, Config};
use std::hash::{BuildHasher, Hasher};

// All-colliding hasher: every key lands in bucket 0.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> ConstHasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

fn single_bucket() -> Config {
    Config {
        auto_grow: true,
        initial_buckets: 1,
        load_factor: 0.75,
    }
}

// Test: end-to-end scenario starting from one bucket.
// Verifies: size, lookup, removal, membership, and snapshot order.
#[test]
fn single_bucket_scenario() {
    let mut t = ChainTable::with_config(single_bucket());
    t.insert("a", 1, true);
    t.insert("b", 2, true);
    t.insert("c", 3, true);

    assert_eq!(t.len(), 3);
    assert_eq!(t.get(&"b"), Some(&2));
    assert_eq!(t.remove(&"b"), Some(2));
    assert!(!t.contains_key(&"b"));
    assert_eq!(t.len(), 2);
    assert_eq!(t.all_keys(), vec!["c", "a"]);
    assert_eq!(t.all_values(), vec![3, 1]);
}

// Test: uniqueness under repeated inserts of the same key.
// Verifies: len stays 1 and enumeration never shows duplicates.
#[test]
fn repeated_inserts_keep_one_entry() {
    let mut t = ChainTable::new();
    for v in 0..50 {
        t.insert("same", v, true);
    }
    assert_eq!(t.len(), 1);
    assert_eq!(t.all_keys(), vec!["same"]);
    assert_eq!(t.get(&"same"), Some(&49));

    for v in 100..110 {
        assert!(!t.insert("same", v, false));
    }
    assert_eq!(t.get(&"same"), Some(&49), "keep-existing must not overwrite");
    assert_eq!(t.len(), 1);
}

// Test: size consistency between len() and a full enumeration walk.
// Verifies: the global order list covers exactly the live entries.
#[test]
fn len_matches_enumeration() {
    let mut t = ChainTable::new();
    for i in 0..100u32 {
        t.insert(i, i, true);
    }
    for i in (0..100u32).step_by(3) {
        t.remove(&i);
    }
    assert_eq!(t.len(), t.all_keys().len());
    assert_eq!(t.len(), t.iter().count());
    assert_eq!(t.len(), 66);
}

// Test: growth trigger under a fully-colliding hasher.
// Assumes: occupancy stays at one bucket, so exactly one growth fires
// (1 -> 3 when the second insert sees occupancy 1/1 above 0.75).
#[test]
fn growth_from_one_bucket_with_collisions() {
    let mut t: ChainTable<&str, i32, ConstBuildHasher> =
        ChainTable::with_config_and_hasher(single_bucket(), ConstBuildHasher);
    t.insert("a", 1, true);
    assert_eq!(t.bucket_count(), 1);
    t.insert("b", 2, true);
    assert_eq!(t.bucket_count(), 3, "expected 1 * 2 + 1");
    t.insert("c", 3, true);
    assert_eq!(t.bucket_count(), 3, "one occupied bucket of three stays put");
    assert_eq!(t.occupied_buckets(), 1);
    assert_eq!(t.all_keys(), vec!["c", "b", "a"]);
}

// Test: defaults and the growth ladder from the default bucket count.
// Verifies: 13 buckets initially; first auto growth yields 27.
#[test]
fn default_growth_ladder() {
    let mut t: ChainTable<u32, u32> = ChainTable::new();
    assert_eq!(t.bucket_count(), 13);
    let mut i = 0;
    while t.bucket_count() == 13 {
        t.insert(i, i, true);
        i += 1;
        assert!(i < 10_000, "growth never triggered");
    }
    assert_eq!(t.bucket_count(), 27);
    // Nothing was lost on the way.
    for k in 0..i {
        assert_eq!(t.get(&k), Some(&k));
    }
}

// Test: auto_grow = false pins the bucket count under arbitrary load;
// a later manual rehash still works and changes nothing observable.
#[test]
fn manual_rehash_with_auto_grow_disabled() {
    let mut t: ChainTable<u32, u32> = ChainTable::with_config(Config {
        auto_grow: false,
        initial_buckets: 3,
        load_factor: 0.75,
    });
    for i in 0..30 {
        t.insert(i, i * 2, true);
    }
    assert_eq!(t.bucket_count(), 3);

    let keys = t.all_keys();
    t.rehash();
    assert_eq!(t.bucket_count(), 7);
    assert_eq!(t.all_keys(), keys);
    assert_eq!(t.len(), 30);
    for i in 0..30 {
        assert_eq!(t.get(&i), Some(&(i * 2)));
    }
}

// Test: construction leniency.
// Verifies: zero buckets corrects to 13; the corrected load factor still
// triggers growth (a kept NaN would never compare true).
#[test]
fn lenient_construction() {
    let t: ChainTable<u32, u32> = ChainTable::with_config(Config {
        auto_grow: true,
        initial_buckets: 0,
        load_factor: f64::NAN,
    });
    assert_eq!(t.bucket_count(), 13);

    let mut t: ChainTable<&str, i32, ConstBuildHasher> = ChainTable::with_config_and_hasher(
        Config {
            auto_grow: true,
            initial_buckets: 1,
            load_factor: -3.0,
        },
        ConstBuildHasher,
    );
    t.insert("a", 1, true);
    t.insert("b", 2, true);
    assert_eq!(t.bucket_count(), 3, "corrected load factor must trigger growth");
}

// Test: removal at every chain position with everything colliding.
// Verifies: chain stays intact around the removed entry; occupancy drops
// only when the bucket empties.
#[test]
fn colliding_chain_survives_removals() {
    let mut t: ChainTable<String, usize, ConstBuildHasher> = ChainTable::with_config_and_hasher(
        Config {
            auto_grow: false,
            initial_buckets: 4,
            load_factor: 0.75,
        },
        ConstBuildHasher,
    );
    let keys: Vec<String> = (0..8).map(|i| format!("k{i}")).collect();
    for (i, k) in keys.iter().enumerate() {
        t.insert(k.clone(), i, true);
    }
    assert_eq!(t.occupied_buckets(), 1);

    // Remove in an inside-out pattern to hit head, tail, and middle.
    for k in ["k3", "k0", "k7", "k5"] {
        assert!(t.remove(k).is_some());
    }
    assert_eq!(t.len(), 4);
    assert_eq!(t.occupied_buckets(), 1);
    for (i, k) in keys.iter().enumerate() {
        let expect_present = !matches!(i, 0 | 3 | 5 | 7);
        assert_eq!(t.contains_key(k.as_str()), expect_present);
        if expect_present {
            assert_eq!(t.get(k.as_str()), Some(&i));
        }
    }
    assert_eq!(t.all_keys(), vec!["k6", "k4", "k2", "k1"]);
}

// Test: snapshots are owned values, not views.
// Verifies: earlier snapshots are unaffected by later mutation.
#[test]
fn snapshots_survive_mutation() {
    let mut t = ChainTable::new();
    t.insert("x".to_string(), 1, true);
    t.insert("y".to_string(), 2, true);

    let keys = t.all_keys();
    let values = t.all_values();
    t.remove("x");
    t.insert("z".to_string(), 3, true);

    assert_eq!(keys, vec!["y".to_string(), "x".to_string()]);
    assert_eq!(values, vec![2, 1]);
    assert_eq!(t.all_keys(), vec!["z".to_string(), "y".to_string()]);
}

// Test: a long random-ish workload leaves the table equivalent to std's
// HashMap on content, while keeping its own order guarantees.
#[test]
fn mixed_workload_matches_std() {
    let mut t: ChainTable<u64, u64> = ChainTable::with_config(Config {
        auto_grow: true,
        initial_buckets: 1,
        load_factor: 0.75,
    });
    let mut std_map = std::collections::HashMap::new();

    let mut s = 7u64;
    for _ in 0..2000 {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        let k = s % 128;
        match s % 3 {
            0 => {
                t.insert(k, s, true);
                std_map.insert(k, s);
            }
            1 => {
                assert_eq!(t.remove(&k), std_map.remove(&k));
            }
            _ => {
                assert_eq!(t.get(&k), std_map.get(&k));
            }
        }
        assert_eq!(t.len(), std_map.len());
    }
    let mut keys = t.all_keys();
    keys.sort_unstable();
    let mut std_keys: Vec<u64> = std_map.keys().copied().collect();
    std_keys.sort_unstable();
    assert_eq!(keys, std_keys);
}
