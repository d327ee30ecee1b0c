//! Process-wide registries for field names and method UIDs.
//!
//! Two monotonically-growing, write-once-per-key maps back the code
//! generator's compact encodings:
//!
//! - The **field-name registry** assigns each distinct struct/attribute
//!   field name a small positive integer ID. ID 0 is reserved for the
//!   synthetic variant-tag field and is never handed out.
//! - The **method-UID registry** assigns each distinct canonical method
//!   serialization a process-wide UID, so downstream phases can reference
//!   overloaded methods compactly.
//!
//! Both registries follow the string table's concurrency scheme: DashMap
//! plus an atomic counter, losers of an insert race adopting the winner's
//! ID. Snapshots can be exported for reproducible codegen between runs.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::LazyLock;

use crate::symbol::Symbol;

/// Field ID of the synthetic variant-tag field.
pub const VARIANT_TAG_FIELD_ID: u32 = 0;

static FIELD_REGISTRY: LazyLock<FieldRegistry> = LazyLock::new(FieldRegistry::new);
static METHOD_REGISTRY: LazyLock<MethodUidRegistry> = LazyLock::new(MethodUidRegistry::new);

/// Look up (or assign) the global ID for a field name.
pub fn field_id(name: Symbol) -> u32 {
    FIELD_REGISTRY.id_of(name)
}

/// Look up (or assign) the global UID for a method's canonical serialization.
pub fn method_uid(serialized: &str) -> u64 {
    METHOD_REGISTRY.uid_of(serialized)
}

/// Export the current field-name assignments, sorted by ID.
pub fn field_snapshot() -> Vec<(String, u32)> {
    FIELD_REGISTRY.snapshot()
}

/// Export the current method-UID assignments, sorted by UID.
pub fn method_snapshot() -> Vec<(String, u64)> {
    METHOD_REGISTRY.snapshot()
}

/// Registry mapping field names to small positive integer IDs.
struct FieldRegistry {
    ids: DashMap<Symbol, u32, ahash::RandomState>,
    // Starts at 1: 0 is the variant tag.
    next: AtomicU32,
}

impl FieldRegistry {
    fn new() -> Self {
        Self {
            ids: DashMap::with_hasher(ahash::RandomState::new()),
            next: AtomicU32::new(VARIANT_TAG_FIELD_ID + 1),
        }
    }

    fn id_of(&self, name: Symbol) -> u32 {
        if let Some(entry) = self.ids.get(&name) {
            return *entry.value();
        }
        let candidate = self.next.fetch_add(1, Ordering::Relaxed);
        match self.ids.entry(name) {
            dashmap::mapref::entry::Entry::Occupied(entry) => *entry.get(),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(candidate);
                candidate
            }
        }
    }

    fn snapshot(&self) -> Vec<(String, u32)> {
        let mut out: Vec<_> = self
            .ids
            .iter()
            .map(|e| (e.key().as_str().to_string(), *e.value()))
            .collect();
        out.sort_by_key(|(_, id)| *id);
        out
    }
}

/// Registry mapping canonical method serializations to UIDs.
struct MethodUidRegistry {
    uids: DashMap<String, u64, ahash::RandomState>,
    next: AtomicU64,
}

impl MethodUidRegistry {
    fn new() -> Self {
        Self {
            uids: DashMap::with_hasher(ahash::RandomState::new()),
            next: AtomicU64::new(0),
        }
    }

    fn uid_of(&self, serialized: &str) -> u64 {
        if let Some(entry) = self.uids.get(serialized) {
            return *entry.value();
        }
        let candidate = self.next.fetch_add(1, Ordering::Relaxed);
        match self.uids.entry(serialized.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(entry) => *entry.get(),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(candidate);
                candidate
            }
        }
    }

    fn snapshot(&self) -> Vec<(String, u64)> {
        let mut out: Vec<_> = self
            .uids
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        out.sort_by_key(|(_, uid)| *uid);
        out
    }
}
