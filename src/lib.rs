//! chain-table: a single-threaded, separate-chaining hash map over a slot
//! arena, with snapshot enumeration in most-recent-first insertion order.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a teaching-grade bucket/chain hash table whose pointer
//!   bookkeeping is expressed entirely through stable arena handles, so the
//!   three views of an entry (bucket chain, order list, slot storage) can be
//!   checked against each other and never dangle.
//! - Structure:
//!   - Entries live in a `SlotMap<DefaultKey, Entry>`; a handle names an
//!     entry for the lifetime of the table, and a freed slot's generation
//!     bump keeps stale handles from aliasing reused storage.
//!   - Each entry carries two pairs of links: `bucket_prev`/`bucket_next`
//!     chain it to the other entries of its bucket, and
//!     `order_prev`/`order_next` thread one global doubly-linked list
//!     through every live entry in insertion order (newest at the head,
//!     because inserts prepend).
//!   - The bucket array is a `Vec<Option<DefaultKey>>` of chain heads, and
//!     is the only structure growth touches.
//!
//! Growth policy
//! - The trigger ratio is occupied buckets over total buckets (not entries
//!   over buckets), compared strictly against the load factor before each
//!   auto-grown insert; the new count is always `old * 2 + 1`, keeping
//!   bucket counts odd.
//! - Rehash walks the order list once and re-links each entry's bucket
//!   chain fields in place. It allocates no entries, frees no entries, and
//!   never touches the order links, so enumeration order survives any
//!   number of rehashes bit-for-bit.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its key's `u64` hash, computed exactly once at
//!   insertion; bucket placement always derives from the stored hash, so
//!   `K: Hash` is never invoked after insertion and rehash runs no user
//!   code.
//!
//! Leniency and errors
//! - Invalid construction parameters (zero buckets, non-positive or NaN
//!   load factor) are corrected to the defaults (13, 0.75), never rejected.
//! - Absent keys are ordinary `None`/`false` results. The only fatal
//!   condition is allocation exhaustion, which aborts like any Rust
//!   collection.
//!
//! Reentrancy policy
//! - Probing runs user code (`K: Hash`/`Eq`), and splicing leaves the links
//!   transiently inconsistent, so the probing and mutating entry points
//!   hold a debug-only reentrancy token; nested entry panics in debug
//!   builds and costs nothing in release builds. Rehash runs no user code
//!   and needs no token.
//!
//! Notes and non-goals
//! - Single-threaded by design; mutation requires `&mut self` and the
//!   debug token is `!Send`/`!Sync`.
//! - Enumeration (`all_keys`, `all_values`) returns owned snapshots, valid
//!   across later mutation; `iter` borrows and is most-recent-first too.
//! - No value-based lookup, no persistence, no shrinking of the bucket
//!   array on removal.

mod chain_table;
mod chain_table_proptest;
mod reentrancy;

// Public surface
pub use chain_table::{ChainTable, Config, Iter};
