//! Declared symbols the resolver navigates: types, namespaces, FFI
//! namespaces.
//!
//! A [`DeclaredType`] owns the unparameterized body the parser produced
//! and the per-declaration cache of concrete instantiations, keyed by
//! the canonical signature of the generic arguments. The cache is the
//! reason resolving `Vec<u32>` twice hands back the same body.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use ternc_util::{Span, Symbol};

use crate::context::Context;
use crate::types::{GenericDecl, InterfaceMethod, Ty};

/// A named type declaration.
pub struct DeclaredType {
    pub name: Symbol,
    pub span: Span,
    pub generic_params: Vec<GenericDecl>,
    /// The unparameterized body as parsed.
    pub body: Ty,
    /// Cache of instantiated bodies keyed by argument signature, in
    /// instantiation order so cache walks are deterministic.
    pub(crate) concrete: RefCell<IndexMap<String, Ty>>,
}

impl DeclaredType {
    pub fn new(name: Symbol, span: Span, generic_params: Vec<GenericDecl>, body: Ty) -> Rc<Self> {
        Rc::new(Self {
            name,
            span,
            generic_params,
            body,
            concrete: RefCell::new(IndexMap::new()),
        })
    }

    /// Whether the declaration takes generic parameters.
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// Look up a cached instantiation.
    pub fn cached(&self, signature: &str) -> Option<Ty> {
        self.concrete.borrow().get(signature).cloned()
    }

    /// Insert an instantiation; first write wins.
    pub fn cache_insert(&self, signature: String, instance: Ty) {
        self.concrete
            .borrow_mut()
            .entry(signature)
            .or_insert(instance);
    }

    /// Number of cached instantiations (diagnostics, tests).
    pub fn cache_len(&self) -> usize {
        self.concrete.borrow().len()
    }

    /// The canonical signature of an ordered argument list.
    pub fn signature_of(args: &[Ty]) -> String {
        args.iter()
            .map(|a| a.serialize(false))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A named namespace with its own nested context.
pub struct DeclaredNamespace {
    pub name: Symbol,
    pub ctx: Context,
}

impl DeclaredNamespace {
    pub fn new(name: Symbol, ctx: Context) -> Rc<Self> {
        Rc::new(Self { name, ctx })
    }
}

/// A foreign-function namespace: a flat set of extern methods.
pub struct FfiDeclaration {
    pub name: Symbol,
    pub methods: Vec<Rc<InterfaceMethod>>,
}

impl FfiDeclaration {
    pub fn new(name: Symbol, methods: Vec<Rc<InterfaceMethod>>) -> Rc<Self> {
        Rc::new(Self { name, methods })
    }

    /// All extern methods with the given name (overloads included).
    pub fn methods_named(&self, name: Symbol) -> Vec<Rc<InterfaceMethod>> {
        self.methods
            .iter()
            .filter(|m| m.name == name)
            .cloned()
            .collect()
    }
}

/// What a context lookup can produce.
#[derive(Clone)]
pub enum SymbolEntry {
    Type(Rc<DeclaredType>),
    Namespace(Rc<DeclaredNamespace>),
    Ffi(Rc<FfiDeclaration>),
}

impl SymbolEntry {
    /// The declared name of the entry.
    pub fn name(&self) -> Symbol {
        match self {
            SymbolEntry::Type(t) => t.name,
            SymbolEntry::Namespace(n) => n.name,
            SymbolEntry::Ffi(f) => f.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BasicKind, DataType};

    fn sp() -> Span {
        Span::DUMMY
    }

    #[test]
    fn test_declared_type_cache_first_write_wins() {
        let decl = DeclaredType::new(
            Symbol::intern("Box"),
            sp(),
            vec![GenericDecl::new(Symbol::intern("T"))],
            DataType::struct_type(vec![], sp()),
        );
        let a = DataType::basic(BasicKind::U8, sp());
        let b = DataType::basic(BasicKind::U16, sp());
        decl.cache_insert("u8".to_string(), a.clone());
        decl.cache_insert("u8".to_string(), b);
        assert!(std::rc::Rc::ptr_eq(&decl.cached("u8").unwrap(), &a));
        assert_eq!(decl.cache_len(), 1);
    }

    #[test]
    fn test_signature_of_orders_args() {
        let args = vec![
            DataType::basic(BasicKind::U8, sp()),
            DataType::basic(BasicKind::I64, sp()),
        ];
        assert_eq!(DeclaredType::signature_of(&args), "u8,i64");
        assert_eq!(DeclaredType::signature_of(&[]), "");
    }

    #[test]
    fn test_is_generic() {
        let plain = DeclaredType::new(
            Symbol::intern("P"),
            sp(),
            vec![],
            DataType::struct_type(vec![], sp()),
        );
        assert!(!plain.is_generic());
    }

    #[test]
    fn test_ffi_methods_named() {
        let m = InterfaceMethod::new(Symbol::intern("puts"), vec![], DataType::void(sp()));
        let ffi = FfiDeclaration::new(Symbol::intern("libc"), vec![m]);
        assert_eq!(ffi.methods_named(Symbol::intern("puts")).len(), 1);
        assert!(ffi.methods_named(Symbol::intern("gets")).is_empty());
    }
}
