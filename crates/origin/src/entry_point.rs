//! Command lines used to launch the driver for an origin.

use conductor_shared::{InvalidArgument, require_non_empty};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Package run when no other driver is configured.
pub const DEFAULT_ENTRY_PACKAGE: &str = "dagster";

/// Ordered command line. An empty list is a valid (if unlaunchable) record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct EntryPoint(Vec<String>);

impl EntryPoint {
    /// Build an entry point from its arguments.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(args.into_iter().map(Into::into).collect())
    }

    /// Arguments in order.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.0
    }

    /// The program to execute, if there is one.
    #[must_use]
    pub fn program(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }
}

impl From<Vec<String>> for EntryPoint {
    fn from(args: Vec<String>) -> Self {
        Self(args)
    }
}

impl From<EntryPoint> for Vec<String> {
    fn from(entry_point: EntryPoint) -> Self {
        entry_point.0
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0.join(" "))
    }
}

/// Which driver package entry points launch.
///
/// Passed explicitly to the code that builds origins instead of living in
/// process-wide constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPointConfig {
    package: String,
}

impl EntryPointConfig {
    /// Launch `package` instead of the default driver.
    pub fn new(package: impl Into<String>) -> Result<Self, InvalidArgument> {
        let package = package.into();
        require_non_empty("package", &package)?;
        Ok(Self { package })
    }

    /// Driver package name.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// `[executable_path, "-m", package]`: run the driver inside a given
    /// interpreter.
    #[must_use]
    pub fn for_executable(&self, executable_path: &str) -> EntryPoint {
        EntryPoint(vec![
            executable_path.to_owned(),
            "-m".to_owned(),
            self.package.clone(),
        ])
    }

    /// `[package]`: run the installed driver command directly.
    #[must_use]
    pub fn standalone(&self) -> EntryPoint {
        EntryPoint(vec![self.package.clone()])
    }
}

impl Default for EntryPointConfig {
    fn default() -> Self {
        Self {
            package: DEFAULT_ENTRY_PACKAGE.to_owned(),
        }
    }
}
