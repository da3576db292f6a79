//! # conductor-shared
//!
//! Shared error handling and snapshot identity for the conductor workspace.
//!
//! - Error envelope types used at every crate boundary
//! - Argument checks for value objects with checked constructors
//! - Canonical record snapshots and content-derived ids
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Serde-compatible** - All public types support serialization

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod snapshot;
pub mod validation;

pub use errors::{ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata, error_code_from_io_kind};
pub use snapshot::{
    RECORD_TAG, SnapshotError, SnapshotId, SnapshotRecord, create_snapshot_id, deserialize_record,
    serialize_record,
};
pub use validation::{InvalidArgument, require_non_empty, require_non_empty_opt};

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_error_types_are_available() {
        let error = ErrorEnvelope::expected(ErrorCode::invalid_argument(), "invalid");
        assert_eq!(error.kind, ErrorKind::Expected);
    }

    #[test]
    fn shared_result_type_is_available() {
        let value: Result<i32> = Ok(5);
        assert!(matches!(value.map(|value| value + 1), Ok(6)));
    }
}
