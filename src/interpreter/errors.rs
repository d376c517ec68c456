//! Errors, warnings and the diagnostics sink
//!
//! This module defines [`RuntimeError`], the single error type every engine
//! operation returns. It pairs an [`ErrorKind`] with an optional
//! [`SourceLocation`]; operations that know their position (member access,
//! casts) attach it themselves, anything else gets the position of the
//! enclosing recovery boundary (see [`Engine::recover`]).
//!
//! All errors are fatal to the current evaluation. Non-fatal conditions are
//! [`Warning`]s, collected by [`Diagnostics`] while evaluation continues.
//!
//! [`Engine::recover`]: crate::interpreter::engine::Engine::recover

use std::fmt;

use thiserror::Error;

use crate::memory::MemoryError;
use crate::types::{Keyword, TypeKind};

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// What went wrong
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Too many levels of indirection for access to [{member}]")]
    TooManyIndirections { member: String },

    #[error("Invalid member name specified : {member}")]
    UnknownMember { member: String },

    #[error("Invalid type for '.' expression")]
    InvalidDirectAccess,

    #[error("Invalid type for '->' expression")]
    InvalidIndirectAccess,

    #[error("Incompatible types for assignment")]
    IncompatibleAssignment,

    #[error("Invalid assignment to bit field")]
    InvalidBitfieldAssignment,

    #[error("Invalid type conversion")]
    InvalidConversion,

    #[error("Invalid typecast")]
    InvalidTypecast,

    #[error("Cannot cast to a 'string'")]
    CastToString,

    #[error("Can't override array")]
    ArrayOverride,

    #[error("invalid combination of type specifiers")]
    InvalidSpecifierCombination,

    #[error("Unknown {} {name}", .kind.keyword())]
    UnknownComposite { kind: TypeKind, name: String },

    #[error("Unknown type '{name}'")]
    UnknownType { name: String },

    #[error("Unexpected token '{token}' in type declaration")]
    UnexpectedTypeToken { token: String },

    #[error("Value of size {size} has no scalar representation")]
    UnaddressableScalar { size: usize },

    #[error("Unsupported size {size} for member [{member}]")]
    UnsupportedMemberSize { member: String, size: usize },

    #[error("Array member [{member}] of a local value has no address")]
    UnaddressableArray { member: String },

    #[error(
        "Member [{member}] needs {size} bytes at offset {offset} but only {available} are held locally"
    )]
    MemberOutOfBounds {
        member: String,
        offset: usize,
        size: usize,
        available: usize,
    },

    #[error("Member [{member}] is too large")]
    MemberTooLarge { member: String },

    #[error("Cannot assign {got} bytes to member [{member}] of {expected} bytes")]
    MemberSizeMismatch {
        member: String,
        expected: usize,
        got: usize,
    },

    #[error("Expected a scalar value, got {got}")]
    NotScalar { got: &'static str },

    #[error("Invalid native word size {size} (must be 4 or 8)")]
    InvalidWordSize { size: usize },

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// A fatal evaluation error, optionally tagged with where it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    kind: ErrorKind,
    location: Option<SourceLocation>,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind) -> Self {
        RuntimeError {
            kind,
            location: None,
        }
    }

    /// Attach a location unless a more precise one is already present
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location.get_or_insert(location);
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}

impl From<ErrorKind> for RuntimeError {
    fn from(kind: ErrorKind) -> Self {
        RuntimeError::new(kind)
    }
}

impl From<MemoryError> for RuntimeError {
    fn from(err: MemoryError) -> Self {
        RuntimeError::new(ErrorKind::Memory(err))
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(
                f,
                "{} at line {}, column {}",
                self.kind, location.line, location.column
            ),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Non-fatal conditions raised while building types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("Invalid combination of sizes ('{keyword}')")]
    InvalidSizeCombination { keyword: Keyword },

    #[error("duplicate type specifier '{keyword}'")]
    DuplicateSpecifier { keyword: Keyword },

    #[error("Supplemental storage class '{keyword}' ignored")]
    SupplementalStorage { keyword: Keyword },
}

/// Collects warnings and the errors reported at recovery boundaries
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
    errors: Vec<RuntimeError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(%warning, "type warning");
        self.warnings.push(warning);
    }

    pub fn report(&mut self, error: &RuntimeError) {
        tracing::error!(%error, "evaluation aborted");
        self.errors.push(error.clone());
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn errors(&self) -> &[RuntimeError] {
        &self.errors
    }

    /// Drain the collected warnings
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}
