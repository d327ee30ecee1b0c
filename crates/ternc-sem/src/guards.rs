//! Recursion guards for resolution, matching, and generic extraction.
//!
//! Three scratch stacks break cycles on self-referential types. They are
//! thread-local so concurrent compilation jobs never observe each
//! other's in-progress work; within a job the engine is synchronous, so
//! a key present on a stack always means "already in progress further up
//! this call chain" and the re-entry returns the conservative answer.
//!
//! Push-on-entry / pop-on-exit is enforced with RAII guards; an early
//! `?` return unwinds the stack correctly.

use std::cell::RefCell;

use crate::context::MatchKey;

thread_local! {
    static RESOLVE_STACK: RefCell<Vec<u32>> = const { RefCell::new(Vec::new()) };
    static EXTRACT_STACK: RefCell<Vec<u32>> = const { RefCell::new(Vec::new()) };
    static MATCH_STACK: RefCell<Vec<MatchKey>> = const { RefCell::new(Vec::new()) };
}

/// Guard for an in-progress `resolve`, keyed by structural hash.
pub(crate) struct ResolveGuard(u32);

/// Enter resolution of the keyed type. `None` means the type is already
/// being resolved further up the stack.
pub(crate) fn enter_resolve(key: u32) -> Option<ResolveGuard> {
    RESOLVE_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.contains(&key) {
            return None;
        }
        stack.push(key);
        Some(ResolveGuard(key))
    })
}

impl Drop for ResolveGuard {
    fn drop(&mut self) {
        RESOLVE_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(popped, Some(self.0));
        });
    }
}

/// Guard for an in-progress generic extraction, keyed by the pattern's
/// structural hash.
pub(crate) struct ExtractGuard(u32);

pub(crate) fn enter_extract(key: u32) -> Option<ExtractGuard> {
    EXTRACT_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.contains(&key) {
            return None;
        }
        stack.push(key);
        Some(ExtractGuard(key))
    })
}

impl Drop for ExtractGuard {
    fn drop(&mut self) {
        EXTRACT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(popped, Some(self.0));
        });
    }
}

/// Guard for an in-progress match. The key shape is identical to the
/// memo key: (expected hash, actual hash, strict).
pub(crate) struct MatchGuard(MatchKey);

pub(crate) fn enter_match(key: MatchKey) -> Option<MatchGuard> {
    MATCH_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.contains(&key) {
            return None;
        }
        stack.push(key);
        Some(MatchGuard(key))
    })
}

impl Drop for MatchGuard {
    fn drop(&mut self) {
        MATCH_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(popped, Some(self.0));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_guard_blocks_reentry() {
        let outer = enter_resolve(7);
        assert!(outer.is_some());
        assert!(enter_resolve(7).is_none());
        assert!(enter_resolve(8).is_some());
        drop(outer);
        assert!(enter_resolve(7).is_some());
    }

    #[test]
    fn test_guard_pops_on_drop() {
        {
            let _g = enter_resolve(42);
        }
        // Popped; re-entry allowed.
        assert!(enter_resolve(42).is_some());
    }

    #[test]
    fn test_match_guard_keys_include_strict() {
        let strict = enter_match((1, 2, true));
        assert!(strict.is_some());
        // Same pair, different strictness: independent entry.
        assert!(enter_match((1, 2, false)).is_some());
        assert!(enter_match((1, 2, true)).is_none());
    }

    #[test]
    fn test_extract_guard_independent_of_resolve() {
        let _r = enter_resolve(5);
        assert!(enter_extract(5).is_some());
    }
}
