//! # conductor-origin
//!
//! Code pointers plus the repository and pipeline origins built from them.
//! Origins are immutable values with a content-addressed id and a canonical
//! payload for crossing process boundaries. This crate depends on `shared`
//! only.

/// Code location handles.
pub mod code_pointer;
/// Entry points and the config that derives them.
pub mod entry_point;
/// Repository and pipeline origins.
pub mod origin;

pub use code_pointer::CodePointer;
pub use entry_point::{DEFAULT_ENTRY_PACKAGE, EntryPoint, EntryPointConfig};
pub use origin::{PipelineOrigin, RepositoryOrigin};

/// Returns the origin crate version.
#[must_use]
pub const fn origin_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
