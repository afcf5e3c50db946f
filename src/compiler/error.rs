//! # Compiler Error Definitions
//!
//! All compilation errors funnel through a single [`CompileError`] enum.
//! Per the error-handling design, every error is fatal and renders to
//! exactly one diagnostic line of the form `Error at line <L>, col <C>:
//! <message>`; there is no accumulation and no recovery.

use thiserror::Error;

/// The single error type threaded through every compiler phase.
#[derive(Error, Debug)]
pub enum CompileError {
    /// A byte the lexer could not classify into any token, or a lone `|`
    /// where `||` was expected.
    #[error("Error at line {line}, col {col}: {message}")]
    Lexical { line: usize, col: usize, message: String },

    /// An unexpected token, a missing required token, or a malformed
    /// top-level declaration.
    #[error("Error at line {line}, col {col}: {message}")]
    Syntax { line: usize, col: usize, message: String },

    /// A reference to an undefined variable or array, detected during code
    /// generation (this language has no separate semantic-analysis pass).
    #[error("Error at line {line}, col {col}: {message}")]
    Semantic { line: usize, col: usize, message: String },

    /// Wraps I/O failures from the driver (unreadable input, unwritable
    /// output). Not part of the core pipeline, but surfaced through the
    /// same error type for a single `main` error path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failure from the AST serializer's `serde_json` backend;
    /// in practice unreachable for a well-formed AST, but `serde_json`'s
    /// API is fallible so the error path must exist.
    #[error("failed to serialize AST: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The optional external assemble/link step failed. Not part of the
    /// core translation pipeline (assembling and linking are this crate's
    /// collaborators, not its job), but surfaced through the same error
    /// type so the driver has one path to report.
    #[error("{0}")]
    Tooling(String),
}

impl CompileError {
    pub fn lexical(line: usize, col: usize, message: impl Into<String>) -> Self {
        CompileError::Lexical { line, col, message: message.into() }
    }

    pub fn syntax(line: usize, col: usize, message: impl Into<String>) -> Self {
        CompileError::Syntax { line, col, message: message.into() }
    }

    pub fn semantic(line: usize, col: usize, message: impl Into<String>) -> Self {
        CompileError::Semantic { line, col, message: message.into() }
    }

    pub fn undefined_variable(line: usize, col: usize, name: &str) -> Self {
        Self::semantic(line, col, format!("undefined variable '{}'", name))
    }
}
