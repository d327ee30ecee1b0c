//! Structured errors raised by the semantic core.
//!
//! Every core operation except matching returns [`SemError`] on failure;
//! the error is also recorded into the context's diagnostic handler at the
//! raise site, so the caller can propagate with `?` without losing the
//! user-visible report. The matcher returns the lighter [`TypeMismatch`]
//! and records nothing: its callers (overload resolution, inference) often
//! discard failures and try another candidate.

use ternc_util::diagnostic::{self, DiagnosticCode};
use ternc_util::Span;
use thiserror::Error;

/// The kinds of errors the semantic core can raise.
#[derive(Debug, Clone, Error)]
pub enum SemErrorKind {
    /// A reference path segment did not resolve to any symbol
    #[error("type `{name}` not found")]
    UnknownName { name: String },

    /// A reference resolved to a symbol that is not a declared type
    #[error("`{name}` is not a declared type")]
    NotADeclaredType { name: String },

    /// Wrong number of type arguments for a declaration
    #[error("type `{name}` requires {expected} type argument(s), got {found}")]
    TypeArgumentArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    /// A generic parameter survived to resolution
    #[error("generic type `{name}` must be substituted before resolution")]
    UnresolvedGeneric { name: String },

    /// An unset placeholder or unresolvable cycle reached resolution
    #[error("cannot resolve type: {detail}")]
    CyclicOrUnset { detail: String },

    /// Structural shape disagreement (field, constructor, parameter, arity)
    #[error("shape mismatch: {detail}")]
    ShapeMismatch { detail: String },

    /// Two overloads of the same name with identical parameter lists
    #[error("duplicate overload of `{name}`: identical parameter lists")]
    DuplicateOverload { name: String },

    /// An operator-named method declared with the wrong arity
    #[error("operator method `{name}` expects {expected} parameter(s), got {found}")]
    OperatorShapeViolation {
        name: String,
        expected: String,
        found: usize,
    },

    /// Constructor navigation failed on a variant
    #[error("variant constructor `{name}` not found")]
    VariantConstructorNotFound { name: String },

    /// Illegal nullable wrapping or nullable access
    #[error("nullability violation: {detail}")]
    NullabilityViolation { detail: String },
}

impl SemErrorKind {
    /// The stable diagnostic code for this error kind.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            SemErrorKind::UnknownName { .. } => diagnostic::E_SEM_UNKNOWN_NAME,
            SemErrorKind::NotADeclaredType { .. } => diagnostic::E_SEM_NOT_A_TYPE,
            SemErrorKind::TypeArgumentArityMismatch { .. } => diagnostic::E_SEM_TYPE_ARG_ARITY,
            SemErrorKind::UnresolvedGeneric { .. } => diagnostic::E_SEM_UNRESOLVED_GENERIC,
            SemErrorKind::CyclicOrUnset { .. } => diagnostic::E_SEM_CYCLIC_OR_UNSET,
            SemErrorKind::ShapeMismatch { .. } => diagnostic::E_SEM_SHAPE_MISMATCH,
            SemErrorKind::DuplicateOverload { .. } => diagnostic::E_SEM_DUPLICATE_OVERLOAD,
            SemErrorKind::OperatorShapeViolation { .. } => diagnostic::E_SEM_OPERATOR_SHAPE,
            SemErrorKind::VariantConstructorNotFound { .. } => {
                diagnostic::E_SEM_CONSTRUCTOR_NOT_FOUND
            }
            SemErrorKind::NullabilityViolation { .. } => diagnostic::E_SEM_NULLABILITY,
        }
    }
}

/// An error raised by a core operation, located at the offending AST node.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct SemError {
    pub kind: SemErrorKind,
    pub span: Span,
}

impl SemError {
    pub fn new(kind: SemErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Result alias for core operations.
pub type SemResult<T> = std::result::Result<T, SemError>;

/// A failed type match.
///
/// Carries only the human-oriented message naming the incompatible
/// shapes; the matcher's caller decides whether it becomes a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TypeMismatch(pub String);

impl TypeMismatch {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result alias for the compatibility engine.
pub type MatchResult = std::result::Result<(), TypeMismatch>;
