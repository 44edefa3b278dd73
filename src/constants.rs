//! App-wide constants.
//!
//! Centralises reserved configuration keys, well-known file names,
//! and environment variable names so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "cliconf";

/// Crate version, as reported by `cliconf --version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package metadata file read from the application directory.
pub const PACKAGE_FILENAME: &str = "package.json";

// ── Reserved configuration keys ─────────────────────────────────────

/// Package metadata attached to the resolved configuration.
pub const PKG_KEY: &str = "_pkg";

/// Positional-argument remainder produced by the argument tokenizer.
pub const ARGS_KEY: &str = "_";

/// Schema tag declared by the defaults file and every file layer.
pub const SCHEMA_KEY: &str = "_schema";

// ── Environment variable names ──────────────────────────────────────

/// Home directory on Windows-family platforms.
pub const ENV_USERPROFILE: &str = "USERPROFILE";

/// Home directory everywhere else.
pub const ENV_HOME: &str = "HOME";

/// Log filter for the `cliconf` binary.
pub const ENV_LOG: &str = "CLICONF_LOG";
