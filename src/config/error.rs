//! Errors raised while resolving configuration layers.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors during config resolution.
///
/// A missing file or environment variable is never an error; it is an
/// empty layer. Every variant here aborts resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: Failed to read configuration file. {message}.", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("${name}: Failed to parse environment variable. {message}.")]
    ParseEnv { name: String, message: String },

    #[error("{source_name}: expected a mapping of options, found {found}")]
    NotAMapping { source_name: String, found: String },

    #[error("{}", render_violations(layer, violations, reference.as_ref()))]
    InvalidLayer {
        layer: String,
        violations: Vec<Violation>,
        /// Defaults file to point the user at, for file-sourced layers.
        reference: Option<PathBuf>,
    },

    #[error("{layer}: {message}")]
    Validator { layer: String, message: String },

    #[error("failed to create config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A single schema violation found in one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A non-empty file layer has no `_schema` tag.
    SchemaUndefined,
    /// The layer's `_schema` differs from the defaults file.
    SchemaChanged,
    /// A top-level key the defaults file does not declare.
    UnknownKey(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::SchemaUndefined => write!(f, "_schema property is not defined"),
            Violation::SchemaChanged => write!(f, "Schema has changed"),
            Violation::UnknownKey(key) => write!(f, "'{key}': is an invalid option."),
        }
    }
}

fn render_violations(
    layer: &str,
    violations: &[Violation],
    reference: Option<&PathBuf>,
) -> String {
    let mut lines: Vec<String> = violations.iter().map(ToString::to_string).collect();
    if let Some(defaults) = reference {
        lines.push(format!(
            "{layer}: Please update based on example in\n  {}",
            defaults.display()
        ));
    }
    format!("\n * {}", lines.join("\n * "))
}
