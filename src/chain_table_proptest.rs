#![cfg(test)]

// Property tests for ChainTable kept inside the crate so each step can also
// cross-check the internal link structure (assert_invariants), not just the
// public surface.

use crate::chain_table::{ChainTable, Config};
use proptest::prelude::*;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    InsertKeep(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Rehash,
    Snapshot,
}

fn arb_config() -> impl Strategy<Value = Config> {
    (
        any::<bool>(),
        0usize..=5,
        prop_oneof![Just(0.75), Just(0.5), Just(1.5), Just(-1.0)],
    )
        .prop_map(|(auto_grow, initial_buckets, load_factor)| Config {
            auto_grow,
            initial_buckets,
            load_factor,
        })
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::InsertKeep(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Get),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            Just(OpI::Rehash),
            Just(OpI::Snapshot),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Shared state-machine body so the default-hasher and all-colliding runs
// check exactly the same invariants.
fn run_state_machine<S: BuildHasher>(
    mut sut: ChainTable<String, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    // Value model plus an explicit order model: front of `order` is the most
    // recent insertion.
    let mut model: HashMap<String, i32> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i].clone();
                let already = model.contains_key(&k);
                let replaced = sut.insert(k.clone(), v, true);
                prop_assert_eq!(replaced, already, "replace result mismatch");
                if !already {
                    order.insert(0, k.clone());
                }
                model.insert(k, v);
            }
            OpI::InsertKeep(i, v) => {
                let k = pool[i].clone();
                let already = model.contains_key(&k);
                let replaced = sut.insert(k.clone(), v, false);
                prop_assert!(!replaced, "keep-existing insert never replaces");
                if !already {
                    order.insert(0, k.clone());
                    model.insert(k, v);
                }
                // Present key: both table and model keep the old value.
            }
            OpI::Remove(i) => {
                let k = pool[i].clone();
                let removed = sut.remove(k.as_str());
                prop_assert_eq!(removed, model.remove(&k));
                order.retain(|o| o != &k);
                // Idempotence: a second remove is always a no-op.
                prop_assert_eq!(sut.remove(k.as_str()), None);
            }
            OpI::Get(i) => {
                let k = pool[i].clone();
                prop_assert_eq!(sut.get(k.as_str()), model.get(&k));
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&s));
            }
            OpI::Rehash => {
                let buckets_before = sut.bucket_count();
                let keys_before = sut.all_keys();
                sut.rehash();
                prop_assert_eq!(sut.bucket_count(), buckets_before * 2 + 1);
                prop_assert_eq!(sut.all_keys(), keys_before, "rehash reordered entries");
            }
            OpI::Snapshot => {
                prop_assert_eq!(sut.all_keys(), order.clone());
                let values: Vec<i32> = order.iter().map(|k| model[k]).collect();
                prop_assert_eq!(sut.all_values(), values);
            }
        }

        // Post-conditions after each op.
        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.occupied_buckets() <= sut.bucket_count());
        prop_assert_eq!(sut.occupied_buckets() == 0, model.is_empty());
    }
    Ok(())
}

// Property: state-machine equivalence against a std HashMap value model and
// an explicit most-recent-first order model, across random configurations
// (including zero buckets and non-positive load factors, which must be
// silently corrected).
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(config in arb_config(), (pool, ops) in arb_scenario()) {
        let sut: ChainTable<String, i32> = ChainTable::with_config(config);
        run_state_machine(sut, &pool, ops)?;
    }
}

// Collision variant: a constant hasher drives every key into one bucket, so
// every operation exercises chain splicing rather than bucket dispatch.
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

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(config in arb_config(), (pool, ops) in arb_scenario()) {
        let sut: ChainTable<String, i32, ConstBuildHasher> =
            ChainTable::with_config_and_hasher(config, ConstBuildHasher);
        run_state_machine(sut, &pool, ops)?;
    }
}
