//! Error taxonomy for the codec.
//!
//! The set of variants is closed on purpose: callers can rely on every
//! failure falling into one of these categories no matter which code path
//! (reference or accelerated) served the call.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The input cannot be tokenized or structurally parsed. Always fatal,
    /// never recovered automatically.
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Structurally well-formed input that violates a declared cardinality
    /// (array length header or tabular row width). Fatal only in strict
    /// mode; lenient mode repairs instead of raising this.
    #[error("validation error: {0}")]
    Validation(String),

    /// A value that cannot be encoded, reported with the path of the
    /// offending node.
    #[error("encode error at {path}: {message}")]
    Encode { path: String, message: String },

    /// Reader or writer failure at the API boundary.
    #[error("io error: {0}")]
    Io(String),

    /// A fault inside the accelerated path, normalized at the boundary so
    /// that it never escapes as an unstructured panic.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Error::Syntax {
            line,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn encode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Encode {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Error::Io(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    /// True for the strict-mode-only cardinality failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
