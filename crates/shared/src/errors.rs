//! Error envelope types and helpers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, io};

/// Metadata attached to errors for diagnostics.
pub type ErrorMetadata = BTreeMap<String, String>;

/// High-level classification of error origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Expected failures (invalid config, bad arguments, user input).
    Expected,
    /// Invariant violations in library logic.
    Invariant,
    /// Unexpected failures (I/O, external collaborators).
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected => formatter.write_str("expected"),
            Self::Invariant => formatter.write_str("invariant"),
            Self::Unexpected => formatter.write_str("unexpected"),
        }
    }
}

/// Stable error code with namespace and identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode {
    namespace: String,
    code: String,
}

impl ErrorCode {
    /// Create a new error code with a namespace and code.
    pub fn new(namespace: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            code: code.into(),
        }
    }

    /// Invalid argument passed to a checked constructor.
    pub fn invalid_argument() -> Self {
        Self::new("core", "invalid_argument")
    }

    /// Not found code.
    pub fn not_found() -> Self {
        Self::new("core", "not_found")
    }

    /// Permission denied code.
    pub fn permission_denied() -> Self {
        Self::new("core", "permission_denied")
    }

    /// I/O error code.
    pub fn io() -> Self {
        Self::new("core", "io")
    }

    /// Internal failure code.
    pub fn internal() -> Self {
        Self::new("core", "internal")
    }

    /// Returns the namespace portion.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the code identifier.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.namespace, self.code)
    }
}

/// Structured error envelope shared across crates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error kind describing the origin category.
    pub kind: ErrorKind,
    /// Stable error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Additional diagnostic metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ErrorMetadata,
}

impl ErrorEnvelope {
    /// Create an expected error.
    pub fn expected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Expected, code, message)
    }

    /// Create an invariant error.
    pub fn invariant(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Invariant, code, message)
    }

    /// Create an unexpected error.
    pub fn unexpected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Unexpected, code, message)
    }

    fn with_kind(kind: ErrorKind, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a single metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} {}: {}", self.kind, self.code, self.message)
    }
}

impl std::error::Error for ErrorEnvelope {}

impl From<io::Error> for ErrorEnvelope {
    fn from(error: io::Error) -> Self {
        let code = error_code_from_io_kind(error.kind());
        Self::unexpected(code, error.to_string())
    }
}

/// Map an I/O error kind onto the shared `core` codes.
#[must_use]
pub fn error_code_from_io_kind(kind: io::ErrorKind) -> ErrorCode {
    match kind {
        io::ErrorKind::NotFound => ErrorCode::not_found(),
        io::ErrorKind::PermissionDenied => ErrorCode::permission_denied(),
        _ => ErrorCode::io(),
    }
}
