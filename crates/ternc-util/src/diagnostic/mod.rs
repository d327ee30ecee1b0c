//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! The semantic core never prints; it records [`Diagnostic`]s into a
//! [`Handler`] owned by the compilation context and returns structured
//! errors to its caller. The driver decides what to do with the collected
//! diagnostics afterwards.
//!
//! # Examples
//!
//! ```
//! use ternc_util::diagnostic::{Diagnostic, Handler};
//! use ternc_util::span::Span;
//!
//! let handler = Handler::new();
//! handler.emit(Diagnostic::error("type `Foo` not found", Span::DUMMY));
//!
//! assert!(handler.has_errors());
//! assert_eq!(handler.error_count(), 1);
//! ```

use crate::span::Span;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that prevents compilation
    Error,
    /// A warning that doesn't prevent compilation
    Warning,
    /// Additional information about a diagnostic
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// A unique code identifying a diagnostic message.
///
/// Codes follow the format `{prefix}{number:04}`, e.g. `E3001`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode {
    /// The prefix ("E" for error, "W" for warning)
    pub prefix: &'static str,
    /// The numeric identifier
    pub number: u32,
}

impl DiagnosticCode {
    /// Create a new diagnostic code.
    #[inline]
    pub const fn new(prefix: &'static str, number: u32) -> Self {
        Self { prefix, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", self.prefix, self.number)
    }
}

impl fmt::Debug for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

// Semantic-phase diagnostic codes.
pub const E_SEM_UNKNOWN_NAME: DiagnosticCode = DiagnosticCode::new("E", 3001);
pub const E_SEM_NOT_A_TYPE: DiagnosticCode = DiagnosticCode::new("E", 3002);
pub const E_SEM_TYPE_ARG_ARITY: DiagnosticCode = DiagnosticCode::new("E", 3003);
pub const E_SEM_UNRESOLVED_GENERIC: DiagnosticCode = DiagnosticCode::new("E", 3004);
pub const E_SEM_CYCLIC_OR_UNSET: DiagnosticCode = DiagnosticCode::new("E", 3005);
pub const E_SEM_SHAPE_MISMATCH: DiagnosticCode = DiagnosticCode::new("E", 3006);
pub const E_SEM_DUPLICATE_OVERLOAD: DiagnosticCode = DiagnosticCode::new("E", 3007);
pub const E_SEM_OPERATOR_SHAPE: DiagnosticCode = DiagnosticCode::new("E", 3008);
pub const E_SEM_CONSTRUCTOR_NOT_FOUND: DiagnosticCode = DiagnosticCode::new("E", 3009);
pub const E_SEM_NULLABILITY: DiagnosticCode = DiagnosticCode::new("E", 3010);

/// A diagnostic message with severity and location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Diagnostic severity level
    pub level: Level,
    /// Main diagnostic message
    pub message: String,
    /// Source location
    pub span: Span,
    /// Optional diagnostic code
    pub code: Option<DiagnosticCode>,
    /// Additional notes for context
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(level: Level, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            message: message.into(),
            span,
            code: None,
            notes: Vec::new(),
        }
    }

    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, message, span)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, message, span)
    }

    /// Set the diagnostic code.
    pub fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a note to the diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Handler for collecting and reporting diagnostics.
///
/// Interior-mutable so the semantic core can record through a shared
/// reference while traversing types it also borrows.
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
    /// Panic on the first error (test mode).
    panic_on_error: bool,
}

impl Handler {
    /// Create a new handler.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            panic_on_error: false,
        }
    }

    /// Create a handler that panics on errors, for tests that must not
    /// produce any.
    pub fn new_panicking() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            panic_on_error: true,
        }
    }

    /// Record a diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        if self.panic_on_error && diagnostic.level == Level::Error {
            panic!("diagnostic error: {}", diagnostic.message);
        }
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Whether any errors have been recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Number of recorded errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Number of recorded warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count()
    }

    /// Clone out all recorded diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Drop all recorded diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}
