//! Argument checks for value objects with checked constructors.

use crate::errors::{ErrorCode, ErrorEnvelope};
use std::fmt;

/// A constructor argument violated its contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidArgument {
    /// Name of the offending parameter.
    pub field: &'static str,
    /// Why the value was rejected.
    pub reason: &'static str,
}

impl InvalidArgument {
    /// Build an invalid-argument error for `field`.
    #[must_use]
    pub const fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "invalid argument `{}`: {}", self.field, self.reason)
    }
}

impl std::error::Error for InvalidArgument {}

impl From<InvalidArgument> for ErrorEnvelope {
    fn from(error: InvalidArgument) -> Self {
        Self::expected(ErrorCode::invalid_argument(), error.to_string())
            .with_metadata("field", error.field)
            .with_metadata("reason", error.reason)
    }
}

/// Require a string parameter to be non-empty. Whitespace counts as content.
pub fn require_non_empty(field: &'static str, value: &str) -> Result<(), InvalidArgument> {
    if value.is_empty() {
        return Err(InvalidArgument::new(field, "must be a non-empty string"));
    }
    Ok(())
}

/// Like [`require_non_empty`], but skips `None`.
pub fn require_non_empty_opt(
    field: &'static str,
    value: Option<&str>,
) -> Result<(), InvalidArgument> {
    value.map_or(Ok(()), |value| require_non_empty(field, value))
}
