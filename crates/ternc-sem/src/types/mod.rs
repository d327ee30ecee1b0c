//! Type representation for the Tern type system.
//!
//! The whole lattice lives in one tagged union, [`TypeKind`], wrapped by
//! [`DataType`] which carries the source span and the lazily computed
//! memo fields. Types are shared behind `Rc` ([`Ty`]); they are born
//! immutable from the parser and stay immutable after resolution except
//! for the interior-mutable memo cells: the structural hash, the resolved
//! flag, the diagnostic back-link set when a reference is dereferenced,
//! the reference base binding, and the variant-constructor parent link.
//!
//! Cyclic type graphs (self-referential structs, variant/constructor
//! parenthood) always pass through a [`ReferenceType`] or a `Weak` parent
//! pointer, so recursive walks that do not chase reference bases
//! terminate.

pub mod display;
pub mod serialize;
pub mod substitute;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use ternc_util::{Span, Symbol};

use crate::context::Context;
use crate::decl::{DeclaredNamespace, DeclaredType, FfiDeclaration};

/// Shared handle to a type.
pub type Ty = Rc<DataType>;

/// Canonical order of the basic scalar kinds.
///
/// The widening rules are phrased in terms of the rank within each family
/// (unsigned, signed, float); the declaration order here is the canonical
/// order diagnostics and serialization use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BasicKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl BasicKind {
    /// Source-level name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            BasicKind::U8 => "u8",
            BasicKind::U16 => "u16",
            BasicKind::U32 => "u32",
            BasicKind::U64 => "u64",
            BasicKind::I8 => "i8",
            BasicKind::I16 => "i16",
            BasicKind::I32 => "i32",
            BasicKind::I64 => "i64",
            BasicKind::F32 => "f32",
            BasicKind::F64 => "f64",
        }
    }

    pub const fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            BasicKind::U8 | BasicKind::U16 | BasicKind::U32 | BasicKind::U64
        )
    }

    pub const fn is_signed_int(self) -> bool {
        matches!(
            self,
            BasicKind::I8 | BasicKind::I16 | BasicKind::I32 | BasicKind::I64
        )
    }

    pub const fn is_integer(self) -> bool {
        self.is_unsigned_int() || self.is_signed_int()
    }

    pub const fn is_float(self) -> bool {
        matches!(self, BasicKind::F32 | BasicKind::F64)
    }

    /// Width rank within the kind's own family: u8/i8/f32 are 0.
    pub const fn family_rank(self) -> u8 {
        match self {
            BasicKind::U8 | BasicKind::I8 => 0,
            BasicKind::U16 | BasicKind::I16 => 1,
            BasicKind::U32 | BasicKind::I32 => 2,
            BasicKind::U64 | BasicKind::I64 => 3,
            BasicKind::F32 => 0,
            BasicKind::F64 => 1,
        }
    }
}

/// An integer literal whose concrete basic kind is still open.
#[derive(Clone, Copy, Debug)]
pub struct LiteralIntType {
    /// Minimum number of bytes needed to hold the literal's value.
    pub width_hint: u8,
}

/// `T[]`
#[derive(Clone)]
pub struct ArrayType {
    pub element: Ty,
}

/// `(A, B, ...)` with arity >= 2.
#[derive(Clone)]
pub struct TupleType {
    pub elements: Vec<Ty>,
}

/// One named field of a struct.
#[derive(Clone)]
pub struct StructField {
    pub name: Symbol,
    pub ty: Ty,
}

/// An ordered-field structural record.
#[derive(Clone)]
pub struct StructType {
    pub fields: Vec<StructField>,
    /// Strict structs match only structurally identical types.
    pub is_strict: bool,
}

/// A struct observed through a partial view (subset of fields known).
#[derive(Clone)]
pub struct PartialStructType {
    pub inner: Ty,
}

/// One named integer member of an enum.
#[derive(Clone, Copy)]
pub struct EnumField {
    pub name: Symbol,
    pub value: i64,
}

/// A named set of integer constants over an integer representation kind.
#[derive(Clone)]
pub struct EnumType {
    pub fields: Vec<EnumField>,
    pub repr: BasicKind,
}

/// An enumerated set of string values.
#[derive(Clone)]
pub struct StringEnumType {
    pub values: Vec<Symbol>,
}

/// A declared generic parameter with an optional constraint.
#[derive(Clone)]
pub struct GenericDecl {
    pub name: Symbol,
    pub constraint: Option<Ty>,
}

impl GenericDecl {
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            constraint: None,
        }
    }

    pub fn with_constraint(name: Symbol, constraint: Ty) -> Self {
        Self {
            name,
            constraint: Some(constraint),
        }
    }
}

/// One function parameter. Order and mutability are part of the
/// function's identity.
#[derive(Clone)]
pub struct FunctionArgument {
    pub name: Symbol,
    pub ty: Ty,
    pub is_mut: bool,
}

impl FunctionArgument {
    pub fn new(name: Symbol, ty: Ty) -> Self {
        Self {
            name,
            ty,
            is_mut: false,
        }
    }

    pub fn new_mut(name: Symbol, ty: Ty) -> Self {
        Self {
            name,
            ty,
            is_mut: true,
        }
    }
}

/// `fn(args) -> ret`, optionally a coroutine function.
#[derive(Clone)]
pub struct FunctionType {
    pub params: Vec<FunctionArgument>,
    pub ret: Ty,
    pub is_coroutine: bool,
}

/// A coroutine instance over a coroutine function type.
#[derive(Clone)]
pub struct CoroutineType {
    pub fn_type: Ty,
}

/// A method of an interface or class.
///
/// Methods may share a name when their parameter lists differ
/// (overloading). The process-wide UID is assigned from the canonical
/// serialization on first request and memoized.
pub struct InterfaceMethod {
    pub name: Symbol,
    pub params: Vec<FunctionArgument>,
    pub ret: Ty,
    pub is_static: bool,
    pub generics: Vec<GenericDecl>,
    uid: Cell<Option<u64>>,
}

impl InterfaceMethod {
    pub fn new(name: Symbol, params: Vec<FunctionArgument>, ret: Ty) -> Rc<Self> {
        Rc::new(Self {
            name,
            params,
            ret,
            is_static: false,
            generics: Vec::new(),
            uid: Cell::new(None),
        })
    }

    pub fn new_static(name: Symbol, params: Vec<FunctionArgument>, ret: Ty) -> Rc<Self> {
        Rc::new(Self {
            name,
            params,
            ret,
            is_static: true,
            generics: Vec::new(),
            uid: Cell::new(None),
        })
    }

    pub fn new_generic(
        name: Symbol,
        generics: Vec<GenericDecl>,
        params: Vec<FunctionArgument>,
        ret: Ty,
    ) -> Rc<Self> {
        Rc::new(Self {
            name,
            params,
            ret,
            is_static: false,
            generics,
            uid: Cell::new(None),
        })
    }

    /// The process-wide UID of this method, assigned by canonical
    /// serialization.
    pub fn uid(&self) -> u64 {
        if let Some(uid) = self.uid.get() {
            return uid;
        }
        let uid = ternc_util::method_uid(&self.serialize_signature());
        self.uid.set(Some(uid));
        uid
    }

    /// View the method as a plain function type at the given span.
    pub fn as_function(&self, span: Span) -> Ty {
        DataType::function(self.params.clone(), self.ret.clone(), span)
    }
}

/// One attribute (data member) of a class.
#[derive(Clone)]
pub struct ClassAttribute {
    pub name: Symbol,
    pub ty: Ty,
    pub is_static: bool,
}

impl ClassAttribute {
    pub fn new(name: Symbol, ty: Ty) -> Self {
        Self {
            name,
            ty,
            is_static: false,
        }
    }
}

/// A class: attributes, methods, declared supertypes (interfaces).
#[derive(Clone)]
pub struct ClassType {
    pub attributes: Vec<ClassAttribute>,
    pub methods: Vec<Rc<InterfaceMethod>>,
    pub supers: Vec<Ty>,
}

/// An interface: methods plus declared super-interfaces.
#[derive(Clone)]
pub struct InterfaceType {
    pub methods: Vec<Rc<InterfaceMethod>>,
    pub supers: Vec<Ty>,
}

/// Structural intersection of two interfaces (or further joins).
///
/// After resolution the join exposes a synthesized interface whose
/// methods are the concatenation of its operands' methods.
pub struct JoinType {
    pub left: Ty,
    pub right: Ty,
    pub(crate) flat: RefCell<Option<Ty>>,
}

impl JoinType {
    /// The synthesized flattened interface, if this join has been resolved.
    pub fn flattened(&self) -> Option<Ty> {
        self.flat.borrow().clone()
    }
}

/// An algebraic sum; its cases are [`VariantConstructorType`] values.
#[derive(Clone)]
pub struct VariantType {
    pub constructors: Vec<Ty>,
}

impl VariantType {
    /// Find a constructor by name.
    pub fn constructor(&self, name: Symbol) -> Option<Ty> {
        self.constructors
            .iter()
            .find(|c| match &c.kind {
                TypeKind::VariantConstructor(vc) => vc.name == name,
                _ => false,
            })
            .cloned()
    }
}

/// One named parameter of a variant constructor.
#[derive(Clone)]
pub struct VariantParameter {
    pub name: Symbol,
    pub ty: Ty,
}

/// One case of a variant.
///
/// The parent link is a weak back-reference whose lifetime equals the
/// variant's; it is restored on every clone. Tags are assigned `0..n-1`
/// in declaration order at resolve time.
pub struct VariantConstructorType {
    pub name: Symbol,
    pub params: Vec<VariantParameter>,
    pub(crate) parent: RefCell<Weak<DataType>>,
    pub(crate) tag: Cell<u16>,
}

impl VariantConstructorType {
    /// The owning variant, if the parent link has been established.
    pub fn parent(&self) -> Option<Ty> {
        self.parent.borrow().upgrade()
    }

    /// Declaration-order tag of this constructor within its variant.
    pub fn tag(&self) -> u16 {
        self.tag.get()
    }
}

/// `T?`
#[derive(Clone)]
pub struct NullableType {
    pub inner: Ty,
}

/// A named handle `(path, type-args)` to a declared type, lazily bound
/// to the declaration's instantiated body. Not a memory pointer.
pub struct ReferenceType {
    pub path: Vec<Symbol>,
    pub type_args: Vec<Ty>,
    pub(crate) usage_ctx: RefCell<Option<Context>>,
    pub(crate) base: RefCell<Option<Ty>>,
    pub(crate) base_decl: RefCell<Option<Rc<DeclaredType>>>,
    pub(crate) partial: Cell<bool>,
}

impl ReferenceType {
    /// The bound base type, once resolution has happened.
    pub fn base(&self) -> Option<Ty> {
        self.base.borrow().clone()
    }

    /// The declaration this reference resolved to.
    pub fn base_decl(&self) -> Option<Rc<DeclaredType>> {
        self.base_decl.borrow().clone()
    }

    /// Whether the reference was resolved in partial mode (raw generic
    /// body, uninstantiated).
    pub fn is_partial(&self) -> bool {
        self.partial.get()
    }

    /// The context this reference was written in, if recorded.
    pub fn usage_context(&self) -> Option<Context> {
        self.usage_ctx.borrow().clone()
    }

    /// Record the context the reference was written in.
    pub fn set_usage_context(&self, ctx: Context) {
        *self.usage_ctx.borrow_mut() = Some(ctx);
    }

    /// Dotted rendering of the path for diagnostics.
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// A generic parameter appearing as a type.
#[derive(Clone)]
pub struct GenericType {
    pub name: Symbol,
    pub constraint: Option<Ty>,
}

/// A union of acceptable types; only valid inside generic constraints.
#[derive(Clone)]
pub struct UnionType {
    pub members: Vec<Ty>,
}

/// A lock wrapping the result type of a guarded computation.
#[derive(Clone)]
pub struct LockType {
    pub ret: Ty,
}

/// A namespace appearing in type position during path navigation.
#[derive(Clone)]
pub struct NamespaceType {
    pub decl: Rc<DeclaredNamespace>,
}

/// A foreign-function namespace.
#[derive(Clone)]
pub struct FfiNamespaceType {
    pub decl: Rc<FfiDeclaration>,
}

/// A method of a foreign-function namespace.
#[derive(Clone)]
pub struct FfiMethodType {
    pub method: Rc<InterfaceMethod>,
    /// Name of the owning FFI namespace.
    pub parent: Symbol,
}

/// The static side of a class used as a first-class value.
#[derive(Clone)]
pub struct MetaClassType {
    pub class: Ty,
    pub generics: Vec<GenericDecl>,
    pub type_args: Vec<Ty>,
}

/// An interface used as a first-class value.
#[derive(Clone)]
pub struct MetaInterfaceType {
    pub interface: Ty,
}

/// A variant's constructor dispenser used as a first-class value.
#[derive(Clone)]
pub struct MetaVariantType {
    pub variant: Ty,
    pub type_args: Vec<Ty>,
}

/// A single variant constructor used as a first-class value.
#[derive(Clone)]
pub struct MetaVariantConstructorType {
    pub constructor: Ty,
    pub type_args: Vec<Ty>,
}

/// An enum used as a first-class value.
#[derive(Clone)]
pub struct MetaEnumType {
    pub enum_type: Ty,
}

/// The tagged union of every type the language can express.
pub enum TypeKind {
    /// Basic numeric scalar
    Basic(BasicKind),
    /// Integer literal with open kind
    LiteralInt(LiteralIntType),
    Bool,
    Null,
    Void,
    /// Bottom type of diverging expressions
    Unreachable,
    /// Placeholder before inference fills a type in
    Unset,
    Array(ArrayType),
    Tuple(TupleType),
    Struct(StructType),
    PartialStruct(PartialStructType),
    Enum(EnumType),
    StringEnum(StringEnumType),
    Class(ClassType),
    Interface(InterfaceType),
    Join(JoinType),
    Variant(VariantType),
    VariantConstructor(VariantConstructorType),
    Function(FunctionType),
    Coroutine(CoroutineType),
    Nullable(NullableType),
    Reference(ReferenceType),
    Generic(GenericType),
    Union(UnionType),
    Lock(LockType),
    Namespace(NamespaceType),
    FfiNamespace(FfiNamespaceType),
    FfiMethod(FfiMethodType),
    MetaClass(MetaClassType),
    MetaInterface(MetaInterfaceType),
    MetaVariant(MetaVariantType),
    MetaVariantConstructor(MetaVariantConstructorType),
    MetaEnum(MetaEnumType),
}

/// A type with its source location and memo fields.
pub struct DataType {
    pub span: Span,
    pub kind: TypeKind,
    /// Memoized 32-bit content hash of the canonical serialization.
    pub(crate) hash: Cell<Option<u32>>,
    /// Set once full resolution has completed.
    pub(crate) resolved: Cell<bool>,
    /// Diagnostic back-link to the reference this type was reached
    /// through, set when a reference is dereferenced.
    pub(crate) original: RefCell<Option<Ty>>,
}

impl DataType {
    /// Wrap a kind into a shared type handle.
    pub fn new(kind: TypeKind, span: Span) -> Ty {
        Rc::new(Self {
            span,
            kind,
            hash: Cell::new(None),
            resolved: Cell::new(false),
            original: RefCell::new(None),
        })
    }

    pub fn basic(kind: BasicKind, span: Span) -> Ty {
        Self::new(TypeKind::Basic(kind), span)
    }

    pub fn literal_int(width_hint: u8, span: Span) -> Ty {
        Self::new(TypeKind::LiteralInt(LiteralIntType { width_hint }), span)
    }

    pub fn bool_type(span: Span) -> Ty {
        Self::new(TypeKind::Bool, span)
    }

    pub fn null(span: Span) -> Ty {
        Self::new(TypeKind::Null, span)
    }

    pub fn void(span: Span) -> Ty {
        Self::new(TypeKind::Void, span)
    }

    pub fn unreachable(span: Span) -> Ty {
        Self::new(TypeKind::Unreachable, span)
    }

    pub fn unset(span: Span) -> Ty {
        Self::new(TypeKind::Unset, span)
    }

    pub fn array(element: Ty, span: Span) -> Ty {
        Self::new(TypeKind::Array(ArrayType { element }), span)
    }

    pub fn tuple(elements: Vec<Ty>, span: Span) -> Ty {
        Self::new(TypeKind::Tuple(TupleType { elements }), span)
    }

    pub fn struct_type(fields: Vec<StructField>, span: Span) -> Ty {
        Self::new(
            TypeKind::Struct(StructType {
                fields,
                is_strict: false,
            }),
            span,
        )
    }

    pub fn strict_struct(fields: Vec<StructField>, span: Span) -> Ty {
        Self::new(
            TypeKind::Struct(StructType {
                fields,
                is_strict: true,
            }),
            span,
        )
    }

    pub fn partial_struct(inner: Ty, span: Span) -> Ty {
        Self::new(TypeKind::PartialStruct(PartialStructType { inner }), span)
    }

    pub fn enum_type(fields: Vec<EnumField>, repr: BasicKind, span: Span) -> Ty {
        Self::new(TypeKind::Enum(EnumType { fields, repr }), span)
    }

    pub fn string_enum(values: Vec<Symbol>, span: Span) -> Ty {
        Self::new(TypeKind::StringEnum(StringEnumType { values }), span)
    }

    pub fn class(
        attributes: Vec<ClassAttribute>,
        methods: Vec<Rc<InterfaceMethod>>,
        supers: Vec<Ty>,
        span: Span,
    ) -> Ty {
        Self::new(
            TypeKind::Class(ClassType {
                attributes,
                methods,
                supers,
            }),
            span,
        )
    }

    pub fn interface(methods: Vec<Rc<InterfaceMethod>>, supers: Vec<Ty>, span: Span) -> Ty {
        Self::new(TypeKind::Interface(InterfaceType { methods, supers }), span)
    }

    pub fn join(left: Ty, right: Ty, span: Span) -> Ty {
        Self::new(
            TypeKind::Join(JoinType {
                left,
                right,
                flat: RefCell::new(None),
            }),
            span,
        )
    }

    /// Build a single constructor; the parent link is established when
    /// the constructor is placed into a variant.
    pub fn variant_constructor(name: Symbol, params: Vec<VariantParameter>, span: Span) -> Ty {
        Self::new(
            TypeKind::VariantConstructor(VariantConstructorType {
                name,
                params,
                parent: RefCell::new(Weak::new()),
                tag: Cell::new(0),
            }),
            span,
        )
    }

    /// Build a variant from constructor types, wiring parent links and
    /// declaration-order tags.
    pub fn variant(constructors: Vec<Ty>, span: Span) -> Ty {
        let variant = Self::new(TypeKind::Variant(VariantType { constructors }), span);
        Self::rewire_constructors(&variant);
        variant
    }

    /// Restore parent links and tags of a variant's constructors.
    pub(crate) fn rewire_constructors(variant: &Ty) {
        if let TypeKind::Variant(v) = &variant.kind {
            for (i, ctor) in v.constructors.iter().enumerate() {
                if let TypeKind::VariantConstructor(vc) = &ctor.kind {
                    *vc.parent.borrow_mut() = Rc::downgrade(variant);
                    vc.tag.set(i as u16);
                }
            }
        }
    }

    pub fn function(params: Vec<FunctionArgument>, ret: Ty, span: Span) -> Ty {
        Self::new(
            TypeKind::Function(FunctionType {
                params,
                ret,
                is_coroutine: false,
            }),
            span,
        )
    }

    pub fn coroutine_function(params: Vec<FunctionArgument>, ret: Ty, span: Span) -> Ty {
        Self::new(
            TypeKind::Function(FunctionType {
                params,
                ret,
                is_coroutine: true,
            }),
            span,
        )
    }

    pub fn coroutine(fn_type: Ty, span: Span) -> Ty {
        Self::new(TypeKind::Coroutine(CoroutineType { fn_type }), span)
    }

    pub fn nullable(inner: Ty, span: Span) -> Ty {
        Self::new(TypeKind::Nullable(NullableType { inner }), span)
    }

    pub fn reference(path: Vec<Symbol>, type_args: Vec<Ty>, span: Span) -> Ty {
        Self::new(
            TypeKind::Reference(ReferenceType {
                path,
                type_args,
                usage_ctx: RefCell::new(None),
                base: RefCell::new(None),
                base_decl: RefCell::new(None),
                partial: Cell::new(false),
            }),
            span,
        )
    }

    pub fn generic(name: Symbol, constraint: Option<Ty>, span: Span) -> Ty {
        Self::new(TypeKind::Generic(GenericType { name, constraint }), span)
    }

    pub fn union(members: Vec<Ty>, span: Span) -> Ty {
        Self::new(TypeKind::Union(UnionType { members }), span)
    }

    pub fn lock(ret: Ty, span: Span) -> Ty {
        Self::new(TypeKind::Lock(LockType { ret }), span)
    }

    pub fn namespace(decl: Rc<DeclaredNamespace>, span: Span) -> Ty {
        Self::new(TypeKind::Namespace(NamespaceType { decl }), span)
    }

    pub fn ffi_namespace(decl: Rc<FfiDeclaration>, span: Span) -> Ty {
        Self::new(TypeKind::FfiNamespace(FfiNamespaceType { decl }), span)
    }

    pub fn ffi_method(method: Rc<InterfaceMethod>, parent: Symbol, span: Span) -> Ty {
        Self::new(TypeKind::FfiMethod(FfiMethodType { method, parent }), span)
    }

    pub fn meta_class(class: Ty, generics: Vec<GenericDecl>, type_args: Vec<Ty>, span: Span) -> Ty {
        Self::new(
            TypeKind::MetaClass(MetaClassType {
                class,
                generics,
                type_args,
            }),
            span,
        )
    }

    pub fn meta_interface(interface: Ty, span: Span) -> Ty {
        Self::new(TypeKind::MetaInterface(MetaInterfaceType { interface }), span)
    }

    pub fn meta_variant(variant: Ty, type_args: Vec<Ty>, span: Span) -> Ty {
        Self::new(
            TypeKind::MetaVariant(MetaVariantType { variant, type_args }),
            span,
        )
    }

    pub fn meta_variant_constructor(constructor: Ty, type_args: Vec<Ty>, span: Span) -> Ty {
        Self::new(
            TypeKind::MetaVariantConstructor(MetaVariantConstructorType {
                constructor,
                type_args,
            }),
            span,
        )
    }

    pub fn meta_enum(enum_type: Ty, span: Span) -> Ty {
        Self::new(TypeKind::MetaEnum(MetaEnumType { enum_type }), span)
    }

    /// Whether full resolution has completed for this node.
    pub fn is_resolved(&self) -> bool {
        self.resolved.get()
    }

    pub(crate) fn mark_resolved(&self) {
        self.resolved.set(true);
    }

    /// The reference this type was reached through, for diagnostics.
    pub fn original(&self) -> Option<Ty> {
        self.original.borrow().clone()
    }

    pub(crate) fn set_original(&self, original: Ty) {
        *self.original.borrow_mut() = Some(original);
    }
}

impl std::fmt::Debug for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DataType({})", self.shortname())
    }
}

/// Follow resolved reference bases to the underlying type.
///
/// An unresolved or partial reference is returned as-is; callers that
/// need the base must resolve first.
pub fn dealias(ty: &Ty) -> Ty {
    let mut current = ty.clone();
    // Bounded: a base chain that loops (malformed mutual aliases) must
    // not hang the walk.
    for _ in 0..64 {
        let next = match &current.kind {
            TypeKind::Reference(r) => match r.base() {
                Some(base) => base,
                None => return current,
            },
            _ => return current,
        };
        current = next;
    }
    current
}

/// Dealias and additionally unwrap a `Nullable` wrapper.
///
/// This is the view the `is`-style kind queries use: a nullable of the
/// probed kind still answers true.
pub fn peel_nullable(ty: &Ty) -> Ty {
    let stripped = dealias(ty);
    match &stripped.kind {
        TypeKind::Nullable(n) => dealias(&n.inner),
        _ => stripped,
    }
}

/// Replace a resolved `Join` with its synthesized flat interface.
pub fn flatten_join(ty: &Ty) -> Ty {
    match &ty.kind {
        TypeKind::Join(j) => j.flattened().unwrap_or_else(|| ty.clone()),
        _ => ty.clone(),
    }
}

/// Whether the type (through references) is a strict structural type.
pub fn is_strict(ty: &Ty) -> bool {
    matches!(&dealias(ty).kind, TypeKind::Struct(s) if s.is_strict)
}

/// Which types admit a `Nullable` wrapper.
///
/// Pointer-shaped and aggregate reference types do; value scalars,
/// tuples, enums, void and friends do not.
pub fn allowed_nullable(ty: &Ty) -> bool {
    match &dealias(ty).kind {
        TypeKind::Interface(_)
        | TypeKind::Class(_)
        | TypeKind::Variant(_)
        | TypeKind::VariantConstructor(_)
        | TypeKind::Struct(_)
        | TypeKind::PartialStruct(_)
        | TypeKind::Array(_)
        | TypeKind::Function(_)
        | TypeKind::Coroutine(_)
        | TypeKind::Join(_)
        | TypeKind::Lock(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ternc_util::Symbol;

    fn sp() -> Span {
        Span::DUMMY
    }

    #[test]
    fn test_basic_kind_families() {
        assert!(BasicKind::U32.is_unsigned_int());
        assert!(BasicKind::I8.is_signed_int());
        assert!(BasicKind::F64.is_float());
        assert!(!BasicKind::F32.is_integer());
    }

    #[test]
    fn test_basic_kind_ranks() {
        assert!(BasicKind::U64.family_rank() > BasicKind::U8.family_rank());
        assert_eq!(BasicKind::I16.family_rank(), BasicKind::U16.family_rank());
    }

    #[test]
    fn test_variant_wires_parents_and_tags() {
        let leaf = DataType::variant_constructor(Symbol::intern("Leaf"), vec![], sp());
        let node = DataType::variant_constructor(Symbol::intern("Node"), vec![], sp());
        let variant = DataType::variant(vec![leaf.clone(), node.clone()], sp());

        let leaf_vc = match &leaf.kind {
            TypeKind::VariantConstructor(vc) => vc,
            _ => unreachable!(),
        };
        let node_vc = match &node.kind {
            TypeKind::VariantConstructor(vc) => vc,
            _ => unreachable!(),
        };
        assert_eq!(leaf_vc.tag(), 0);
        assert_eq!(node_vc.tag(), 1);
        assert!(Rc::ptr_eq(&leaf_vc.parent().unwrap(), &variant));
    }

    #[test]
    fn test_variant_constructor_lookup() {
        let a = DataType::variant_constructor(Symbol::intern("A"), vec![], sp());
        let variant = DataType::variant(vec![a], sp());
        let v = match &variant.kind {
            TypeKind::Variant(v) => v,
            _ => unreachable!(),
        };
        assert!(v.constructor(Symbol::intern("A")).is_some());
        assert!(v.constructor(Symbol::intern("B")).is_none());
    }

    #[test]
    fn test_dealias_unresolved_reference() {
        let r = DataType::reference(vec![Symbol::intern("Foo")], vec![], sp());
        assert!(Rc::ptr_eq(&dealias(&r), &r));
    }

    #[test]
    fn test_peel_nullable() {
        let inner = DataType::array(DataType::basic(BasicKind::U8, sp()), sp());
        let nullable = DataType::nullable(inner.clone(), sp());
        assert!(Rc::ptr_eq(&peel_nullable(&nullable), &inner));
    }

    #[test]
    fn test_allowed_nullable_table() {
        let u8_ty = DataType::basic(BasicKind::U8, sp());
        let arr = DataType::array(u8_ty.clone(), sp());
        let tup = DataType::tuple(vec![u8_ty.clone(), u8_ty.clone()], sp());
        let iface = DataType::interface(vec![], vec![], sp());

        assert!(allowed_nullable(&arr));
        assert!(allowed_nullable(&iface));
        assert!(!allowed_nullable(&u8_ty));
        assert!(!allowed_nullable(&tup));
        assert!(!allowed_nullable(&DataType::void(sp())));
        assert!(!allowed_nullable(&DataType::bool_type(sp())));
    }

    #[test]
    fn test_is_strict_only_for_strict_structs() {
        let plain = DataType::struct_type(vec![], sp());
        let strict = DataType::strict_struct(vec![], sp());
        assert!(!is_strict(&plain));
        assert!(is_strict(&strict));
    }

    #[test]
    fn test_method_uid_stable_per_signature() {
        let m1 = InterfaceMethod::new(
            Symbol::intern("f"),
            vec![FunctionArgument::new(
                Symbol::intern("x"),
                DataType::basic(BasicKind::U32, sp()),
            )],
            DataType::void(sp()),
        );
        let m2 = InterfaceMethod::new(
            Symbol::intern("f"),
            vec![FunctionArgument::new(
                Symbol::intern("x"),
                DataType::basic(BasicKind::U32, sp()),
            )],
            DataType::void(sp()),
        );
        assert_eq!(m1.uid(), m2.uid());
    }
}
