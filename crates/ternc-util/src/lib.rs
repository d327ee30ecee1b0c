//! ternc-util - Core Utilities and Foundation Types
//!
//! Foundation crate for the Tern compiler (`ternc`). It carries the types
//! every phase shares and nothing phase-specific:
//!
//! - **Spans** ([`span`]): source locations attached to every type and
//!   diagnostic.
//! - **Symbols** ([`symbol`]): 4-byte interned strings for identifiers,
//!   backed by a lock-free global table. Name comparison in the semantic
//!   core is an integer compare.
//! - **Registries** ([`registry`]): the process-wide field-name and
//!   method-UID registries the code generator keys its compact encodings
//!   on. Write-once-per-name, monotonically growing.
//! - **Diagnostics** ([`diagnostic`]): the `Handler` sink the semantic
//!   core records errors into, with stable diagnostic codes.
//!
//! Everything here is designed to be cheap to copy and safe to share;
//! the only global state is the interner and the two registries, which
//! grow monotonically for the process lifetime.

pub mod diagnostic;
pub mod registry;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, DiagnosticCode, Handler, Level};
pub use registry::{field_id, field_snapshot, method_snapshot, method_uid, VARIANT_TAG_FIELD_ID};
pub use span::{FileId, Span};
pub use symbol::Symbol;
