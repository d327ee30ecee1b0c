//! The compilation context the core operates against.
//!
//! A [`Context`] is one scope in a chain: it owns a symbol map, knows its
//! package, points at its parent, and carries the diagnostic [`Handler`]
//! plus the per-context match memo. Cloning a context clones the handle,
//! not the scope; `Rc` identity is context identity.
//!
//! Dropping a context drops its memo with it, which is the whole
//! invalidation story: types are immutable once resolved, so memo entries
//! can never go stale within a context's lifetime.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use ternc_util::{Diagnostic, Handler, Span, Symbol};

use crate::decl::{DeclaredNamespace, DeclaredType, FfiDeclaration, SymbolEntry};
use crate::error::{MatchResult, SemError, SemErrorKind};
use crate::types::{InterfaceMethod, Ty};

/// Key of a memoized match: (expected hash, actual hash, strict).
pub(crate) type MatchKey = (u32, u32, bool);

struct ContextData {
    package: Symbol,
    parent: Option<Context>,
    symbols: RefCell<FxHashMap<Symbol, SymbolEntry>>,
    handler: Rc<Handler>,
    active_class: RefCell<Option<Ty>>,
    active_method: RefCell<Option<Rc<InterfaceMethod>>>,
    match_memo: RefCell<FxHashMap<MatchKey, MatchResult>>,
}

/// A shared handle to one scope of the symbol table.
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextData>,
}

impl Context {
    /// Create a root context for a package.
    pub fn new(package: &str, handler: Rc<Handler>) -> Self {
        Self {
            inner: Rc::new(ContextData {
                package: Symbol::intern(package),
                parent: None,
                symbols: RefCell::new(FxHashMap::default()),
                handler,
                active_class: RefCell::new(None),
                active_method: RefCell::new(None),
                match_memo: RefCell::new(FxHashMap::default()),
            }),
        }
    }

    /// Create a nested scope in the same package.
    pub fn child(&self) -> Self {
        Self {
            inner: Rc::new(ContextData {
                package: self.inner.package,
                parent: Some(self.clone()),
                symbols: RefCell::new(FxHashMap::default()),
                handler: self.inner.handler.clone(),
                active_class: RefCell::new(None),
                active_method: RefCell::new(None),
                match_memo: RefCell::new(FxHashMap::default()),
            }),
        }
    }

    /// Create a nested scope belonging to a different package
    /// (namespace bodies, imported modules).
    pub fn child_in_package(&self, package: &str) -> Self {
        Self {
            inner: Rc::new(ContextData {
                package: Symbol::intern(package),
                parent: Some(self.clone()),
                symbols: RefCell::new(FxHashMap::default()),
                handler: self.inner.handler.clone(),
                active_class: RefCell::new(None),
                active_method: RefCell::new(None),
                match_memo: RefCell::new(FxHashMap::default()),
            }),
        }
    }

    /// The package this scope belongs to.
    pub fn package(&self) -> Symbol {
        self.inner.package
    }

    /// The diagnostic sink.
    pub fn handler(&self) -> &Handler {
        &self.inner.handler
    }

    /// Whether two handles denote the same scope.
    pub fn same_scope(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Declare a symbol in this scope.
    pub fn declare(&self, entry: SymbolEntry) {
        self.inner.symbols.borrow_mut().insert(entry.name(), entry);
    }

    /// Declare a type in this scope.
    pub fn declare_type(&self, decl: Rc<DeclaredType>) {
        self.declare(SymbolEntry::Type(decl));
    }

    /// Declare a namespace in this scope.
    pub fn declare_namespace(&self, decl: Rc<DeclaredNamespace>) {
        self.declare(SymbolEntry::Namespace(decl));
    }

    /// Declare an FFI namespace in this scope.
    pub fn declare_ffi(&self, decl: Rc<FfiDeclaration>) {
        self.declare(SymbolEntry::Ffi(decl));
    }

    /// Resolve a name by walking outward through the scope chain.
    pub fn lookup(&self, name: Symbol) -> Option<SymbolEntry> {
        let mut scope = Some(self.clone());
        while let Some(ctx) = scope {
            if let Some(entry) = ctx.inner.symbols.borrow().get(&name) {
                return Some(entry.clone());
            }
            scope = ctx.inner.parent.clone();
        }
        None
    }

    /// The class whose body is currently being analyzed, if any.
    pub fn active_class(&self) -> Option<Ty> {
        let own = self.inner.active_class.borrow().clone();
        own.or_else(|| {
            self.inner
                .parent
                .as_ref()
                .and_then(|p| p.active_class())
        })
    }

    pub fn set_active_class(&self, class: Option<Ty>) {
        *self.inner.active_class.borrow_mut() = class;
    }

    /// The method whose body is currently being analyzed, if any.
    pub fn active_method(&self) -> Option<Rc<InterfaceMethod>> {
        let own = self.inner.active_method.borrow().clone();
        own.or_else(|| {
            self.inner
                .parent
                .as_ref()
                .and_then(|p| p.active_method())
        })
    }

    pub fn set_active_method(&self, method: Option<Rc<InterfaceMethod>>) {
        *self.inner.active_method.borrow_mut() = method;
    }

    /// Raise a semantic error: record the diagnostic and hand back the
    /// structured error for `?` propagation.
    pub fn raise(&self, kind: SemErrorKind, span: Span) -> SemError {
        let diag = Diagnostic::error(kind.to_string(), span).with_code(kind.code());
        self.inner.handler.emit(diag);
        SemError::new(kind, span)
    }

    pub(crate) fn memo_get(&self, key: &MatchKey) -> Option<MatchResult> {
        self.inner.match_memo.borrow().get(key).cloned()
    }

    pub(crate) fn memo_insert(&self, key: MatchKey, result: MatchResult) {
        self.inner.match_memo.borrow_mut().insert(key, result);
    }

    /// Number of memoized match results (tests, diagnostics).
    pub fn memo_len(&self) -> usize {
        self.inner.match_memo.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;
    use ternc_util::Span;

    fn root() -> Context {
        Context::new("main", Rc::new(Handler::new()))
    }

    #[test]
    fn test_lookup_walks_scope_chain() {
        let outer = root();
        let decl = DeclaredType::new(
            Symbol::intern("Point"),
            Span::DUMMY,
            vec![],
            DataType::struct_type(vec![], Span::DUMMY),
        );
        outer.declare_type(decl);

        let inner = outer.child();
        assert!(inner.lookup(Symbol::intern("Point")).is_some());
        assert!(inner.lookup(Symbol::intern("Missing")).is_none());
    }

    #[test]
    fn test_inner_declaration_shadows_outer() {
        let outer = root();
        outer.declare_type(DeclaredType::new(
            Symbol::intern("T"),
            Span::DUMMY,
            vec![],
            DataType::struct_type(vec![], Span::DUMMY),
        ));
        let inner = outer.child();
        let shadow = DeclaredType::new(
            Symbol::intern("T"),
            Span::DUMMY,
            vec![],
            DataType::void(Span::DUMMY),
        );
        inner.declare_type(shadow.clone());

        match inner.lookup(Symbol::intern("T")) {
            Some(SymbolEntry::Type(found)) => assert!(Rc::ptr_eq(&found, &shadow)),
            _ => panic!("expected shadowing declaration"),
        }
    }

    #[test]
    fn test_child_keeps_package() {
        let outer = root();
        let inner = outer.child();
        assert_eq!(inner.package(), outer.package());

        let other = outer.child_in_package("lib");
        assert_eq!(other.package(), Symbol::intern("lib"));
    }

    #[test]
    fn test_raise_records_diagnostic() {
        let ctx = root();
        let err = ctx.raise(
            SemErrorKind::UnknownName {
                name: "Foo".to_string(),
            },
            Span::DUMMY,
        );
        assert!(ctx.handler().has_errors());
        assert!(matches!(err.kind, SemErrorKind::UnknownName { .. }));
    }

    #[test]
    fn test_active_class_inherited_by_children() {
        let outer = root();
        let class = DataType::class(vec![], vec![], vec![], Span::DUMMY);
        outer.set_active_class(Some(class.clone()));

        let inner = outer.child();
        assert!(Rc::ptr_eq(&inner.active_class().unwrap(), &class));
    }

    #[test]
    fn test_memo_round_trip() {
        let ctx = root();
        let key = (1u32, 2u32, false);
        assert!(ctx.memo_get(&key).is_none());
        ctx.memo_insert(key, Ok(()));
        assert_eq!(ctx.memo_get(&key), Some(Ok(())));
        assert_eq!(ctx.memo_len(), 1);
    }
}
