//! cliconf — layered configuration for command-line tools (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod argv;
pub mod command;
pub mod config;
pub mod constants;
pub mod env;
pub mod paths;
