//! Local CLI command handlers.

pub mod config;
pub mod origin;

pub use config::{ConfigSource, run_config_check, run_config_schema, run_config_show};
pub use origin::{OriginIdArgs, run_origin_id};
