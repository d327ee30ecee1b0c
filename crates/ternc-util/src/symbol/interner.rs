//! String interner implementation using DashMap for concurrent access.
//!
//! The table is write-once-per-name: a string is allocated at most once
//! and never removed. Interned strings are leaked to obtain `'static`
//! references, which is acceptable for a compiler process whose total
//! identifier volume is bounded by the source it reads.

use dashmap::DashMap;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

use super::Symbol;

/// Global string table instance.
pub static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(StringTable::new);

/// Thread-safe string table.
///
/// Two maps are kept in sync: `forward` resolves a string to its index,
/// `reverse` resolves an index back to the string. Both sides are O(1);
/// the reverse direction is what diagnostics hit on every rendered name.
pub struct StringTable {
    /// string -> symbol index
    forward: DashMap<&'static str, u32, ahash::RandomState>,
    /// symbol index -> string
    reverse: DashMap<u32, &'static str, ahash::RandomState>,
    /// Next free index.
    next_index: AtomicU32,
}

impl StringTable {
    fn new() -> Self {
        Self {
            forward: DashMap::with_capacity_and_hasher(256, ahash::RandomState::new()),
            reverse: DashMap::with_capacity_and_hasher(256, ahash::RandomState::new()),
            next_index: AtomicU32::new(0),
        }
    }

    /// Intern a string, returning its symbol.
    ///
    /// Thread-safe; concurrent interns of the same string race on the
    /// `forward` entry and the loser discards its candidate index, so a
    /// string maps to exactly one index for the process lifetime.
    pub fn intern(&self, string: &str) -> Symbol {
        if let Some(entry) = self.forward.get(string) {
            return Symbol { index: *entry.value() };
        }

        let leaked: &'static str = Box::leak(string.to_string().into_boxed_str());
        let candidate = self.next_index.fetch_add(1, Ordering::Relaxed);

        match self.forward.entry(leaked) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                // Another thread won the race; its index is authoritative.
                Symbol { index: *entry.get() }
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(candidate);
                self.reverse.insert(candidate, leaked);
                Symbol { index: candidate }
            }
        }
    }

    /// Resolve a symbol index back to its string.
    ///
    /// Returns the empty string for an index this table never produced.
    pub fn resolve(&self, index: u32) -> &'static str {
        self.reverse.get(&index).map(|e| *e.value()).unwrap_or("")
    }

    /// Number of unique interned strings.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Hash a string with the table's hasher. Exposed for registries that
    /// want hash-compatible keys.
    pub fn hash_of(&self, string: &str) -> u64 {
        let mut hasher = ahash::RandomState::new().build_hasher();
        string.hash(&mut hasher);
        hasher.finish()
    }
}
