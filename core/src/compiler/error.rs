//! Bytecode compilation errors.

use crate::String;

/// Errors that can occur during bytecode compilation.
///
/// Compilation stops at the first error; no partial executable is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// A name that no enclosing scope binds.
    #[error("Unresolved reference '{0}'")]
    UnresolvedReference(String),
    /// Neither a user function nor a native function of this name exists.
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),
    /// The tree or the transition sequence is structurally invalid.
    #[error("Malformed tree: {0}")]
    MalformedTree(String),
    /// A node of a valid kind in a position where another kind is required.
    #[error("Expected {expected}, found {found}")]
    UnexpectedNodeKind {
        expected: &'static str,
        found: &'static str,
    },
    /// More slots than fit in a `u16` id.
    #[error("Too many slots (limit: 65535)")]
    TooManySlots,
    /// Code addresses no longer fit in a `u16`.
    #[error("Code too large (limit: 65535 bytes)")]
    CodeTooLarge,
    /// The tree nests deeper than the configured limit.
    #[error("Nesting too deep (limit: {0})")]
    NestingTooDeep(usize),
}

impl CompileError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        CompileError::MalformedTree(reason.into())
    }
}
