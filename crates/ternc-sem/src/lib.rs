//! ternc-sem - Semantic Analysis Core: Types, Resolution, Compatibility
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! This crate is the type engine of the Tern compiler. It owns three
//! tightly coupled subsystems:
//!
//! 1. TYPE REPRESENTATION
//!    The tagged algebra of [`TypeKind`] variants behind shared [`Ty`]
//!    handles: scalars, arrays, tuples, structs, classes, interfaces,
//!    variants and their constructors, generics, nullables, function and
//!    coroutine types, joins, references, and meta types. Types carry
//!    their source span, a lazily computed structural hash, and the
//!    diagnostic back-link from reference dereferencing.
//!
//! 2. TYPE RESOLUTION
//!    [`resolve`] turns named references (a package path plus type
//!    arguments) into concrete bodies via symbol lookup, unwraps
//!    namespaces, navigates variant constructors, caches generic
//!    instantiations per declaration, and guards recursion with a
//!    resolve stack so self-referential types terminate.
//!
//! 3. TYPE COMPATIBILITY
//!    [`match_types`] decides assignability in two modes. Non-strict is
//!    assignability (integer widening, interface width-subtyping,
//!    nullable absorption, literal-int promotion); strict is structural
//!    identity and backs overload-collision detection. On top of it,
//!    [`extract_generics`] unifies a parametric pattern against a
//!    concrete usage type to infer generic bindings.
//!
//! The engine is synchronous and single-threaded per compilation job;
//! the recursion guards are thread-local and the match memo lives on the
//! [`Context`] and dies with it. Process-wide state is limited to the
//! interner and the field/method registries in `ternc-util`.
//!
//! Errors are structured ([`SemError`]) and recorded into the context's
//! diagnostic handler at the raise site. The matcher is the exception:
//! it returns [`TypeMismatch`] without recording, so inference can probe
//! candidates cheaply.

pub mod compat;
pub mod context;
pub mod decl;
pub mod error;
pub mod generics;
pub mod resolve;
pub mod types;

mod edge_cases;
mod guards;

pub use compat::{
    are_signatures_identical, are_types_identical, can_cast, check_member_access,
    check_optional_access, match_types, optional_chain_return,
};
pub use context::Context;
pub use decl::{DeclaredNamespace, DeclaredType, FfiDeclaration, SymbolEntry};
pub use error::{MatchResult, SemError, SemErrorKind, SemResult, TypeMismatch};
pub use generics::{extract_generics, GenericBinding};
pub use resolve::resolve;
pub use types::{
    allowed_nullable, dealias, flatten_join, is_strict, peel_nullable, BasicKind, ClassAttribute,
    ClassType, DataType, EnumField, EnumType, FunctionArgument, FunctionType, GenericDecl,
    InterfaceMethod, InterfaceType, JoinType, ReferenceType, StructField, StructType, Ty,
    TypeKind, VariantConstructorType, VariantParameter, VariantType,
};
