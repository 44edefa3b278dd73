//! Configuration resolution and layering.
//!
//! Reads package defaults, the local config file, ancestor config files,
//! an environment variable and command line arguments, validates each
//! layer against the defaults, and merges them in priority order.

pub mod ancestors;
pub mod error;
pub mod loader;
pub mod merge;
pub mod reader;
pub mod schema;

pub use ancestors::{find_ancestor_config_files, find_ancestor_config_files_from};
pub use error::{ConfigError, Violation};
pub use loader::{Ancestors, LayerPaths, ResolveOptions, resolve};
pub use merge::{MergeStrategy, deep_merge, shallow_merge};
pub use reader::{ConfigParser, Format, read_config_file};
pub use schema::{LayerValidator, Schema, validate_layer};
