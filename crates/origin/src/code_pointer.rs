//! Handles naming where loadable user code lives.

use conductor_shared::{InvalidArgument, require_non_empty, require_non_empty_opt};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a code target: a callable or attribute inside a module, a
/// source file, or an installed package.
///
/// Pointers are only stored and compared here; resolving them to loadable
/// code belongs to the process that executes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "snake_case",
    try_from = "CodePointerRepr"
)]
pub enum CodePointer {
    /// A function inside an importable module.
    Module {
        /// Dotted module path.
        module: String,
        /// Function name within the module.
        fn_name: String,
    },
    /// A function defined in a source file.
    File {
        /// Path of the source file.
        python_file: String,
        /// Function name within the file.
        fn_name: String,
        /// Directory to run from, when it differs from the file's.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        working_directory: Option<String>,
    },
    /// An attribute exported by an installed package.
    Package {
        /// Installed package name.
        package_name: String,
        /// Attribute exported by the package.
        attribute: String,
    },
}

impl CodePointer {
    /// Point at `fn_name` inside `module`.
    pub fn module(
        module: impl Into<String>,
        fn_name: impl Into<String>,
    ) -> Result<Self, InvalidArgument> {
        let pointer = Self::Module {
            module: module.into(),
            fn_name: fn_name.into(),
        };
        pointer.check()?;
        Ok(pointer)
    }

    /// Point at `fn_name` defined in `python_file`.
    pub fn file(
        python_file: impl Into<String>,
        fn_name: impl Into<String>,
        working_directory: Option<String>,
    ) -> Result<Self, InvalidArgument> {
        let pointer = Self::File {
            python_file: python_file.into(),
            fn_name: fn_name.into(),
            working_directory,
        };
        pointer.check()?;
        Ok(pointer)
    }

    /// Point at `attribute` exported by `package_name`.
    pub fn package(
        package_name: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Result<Self, InvalidArgument> {
        let pointer = Self::Package {
            package_name: package_name.into(),
            attribute: attribute.into(),
        };
        pointer.check()?;
        Ok(pointer)
    }

    /// Re-run the constructor checks on a pointer built by hand.
    pub fn check(&self) -> Result<(), InvalidArgument> {
        match self {
            Self::Module { module, fn_name } => {
                require_non_empty("module", module)?;
                require_non_empty("fn_name", fn_name)
            },
            Self::File {
                python_file,
                fn_name,
                working_directory,
            } => {
                require_non_empty("python_file", python_file)?;
                require_non_empty("fn_name", fn_name)?;
                require_non_empty_opt("working_directory", working_directory.as_deref())
            },
            Self::Package {
                package_name,
                attribute,
            } => {
                require_non_empty("package_name", package_name)?;
                require_non_empty("attribute", attribute)
            },
        }
    }

    /// Human-readable location.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Module { module, fn_name } => format!("from {module} import {fn_name}"),
            Self::File {
                python_file,
                fn_name,
                working_directory: None,
            } => format!("{python_file}::{fn_name}"),
            Self::File {
                python_file,
                fn_name,
                working_directory: Some(directory),
            } => format!("{python_file}::{fn_name} -- [dir {directory}]"),
            Self::Package {
                package_name,
                attribute,
            } => format!("from {package_name} import {attribute}"),
        }
    }
}

impl fmt::Display for CodePointer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.describe())
    }
}

// Unchecked wire shape; decoding goes through `TryFrom` so received pointers
// satisfy the same checks as constructed ones.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
enum CodePointerRepr {
    Module {
        module: String,
        fn_name: String,
    },
    File {
        python_file: String,
        fn_name: String,
        #[serde(default)]
        working_directory: Option<String>,
    },
    Package {
        package_name: String,
        attribute: String,
    },
}

impl TryFrom<CodePointerRepr> for CodePointer {
    type Error = InvalidArgument;

    fn try_from(repr: CodePointerRepr) -> Result<Self, Self::Error> {
        match repr {
            CodePointerRepr::Module { module, fn_name } => Self::module(module, fn_name),
            CodePointerRepr::File {
                python_file,
                fn_name,
                working_directory,
            } => Self::file(python_file, fn_name, working_directory),
            CodePointerRepr::Package {
                package_name,
                attribute,
            } => Self::package(package_name, attribute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn constructors_reject_blank_components() {
        assert_eq!(
            CodePointer::module("", "define_repo"),
            Err(InvalidArgument::new("module", "must be a non-empty string"))
        );
        assert_eq!(
            CodePointer::file("repo.py", "fn", Some(String::new())),
            Err(InvalidArgument::new(
                "working_directory",
                "must be a non-empty string"
            ))
        );
        assert!(CodePointer::package("pkg", "").is_err());
    }

    #[test]
    fn describe_names_the_location() -> Result<(), InvalidArgument> {
        assert_eq!(
            CodePointer::module("acme.repo", "define_repo")?.describe(),
            "from acme.repo import define_repo"
        );
        assert_eq!(
            CodePointer::file("/code/repo.py", "define_repo", Some("/code".to_owned()))?
                .to_string(),
            "/code/repo.py::define_repo -- [dir /code]"
        );
        Ok(())
    }

    #[test]
    fn decoding_reruns_constructor_checks() -> Result<(), Box<dyn Error>> {
        let pointer = CodePointer::file("repo.py", "define_repo", None)?;
        let json = serde_json::to_string(&pointer)?;
        assert_eq!(
            json,
            r#"{"kind":"file","python_file":"repo.py","fn_name":"define_repo"}"#
        );
        assert_eq!(serde_json::from_str::<CodePointer>(&json)?, pointer);

        let blank = r#"{"kind":"module","module":"","fn_name":"f"}"#;
        assert!(serde_json::from_str::<CodePointer>(blank).is_err());
        Ok(())
    }
}
