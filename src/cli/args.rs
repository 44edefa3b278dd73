//! Clap argument types for the `cliconf` binary.

use std::path::PathBuf;

use clap::Parser;

use cliconf::config::{Ancestors, Format, MergeStrategy, ResolveOptions};

/// Resolve layered configuration for an application and inspect the result.
///
/// Everything after the options is treated as the application's own command
/// line: flags become the command line layer, words select a command.
#[derive(Parser, Debug)]
#[command(name = "cliconf", version = cliconf::constants::VERSION)]
pub struct Cli {
    /// Application directory holding package.json and the defaults file.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Config file name (default: .<package name>.json).
    #[arg(long)]
    pub config_file: Option<String>,

    /// Local config file to use instead of ~/<config file>.
    #[arg(long)]
    pub local: Option<PathBuf>,

    /// Merge config files found in the current and parent directories.
    /// Pass `--ancestors=NAME` to search for a different file name.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "")]
    pub ancestors: Option<String>,

    /// Environment variable holding a serialized config layer.
    #[arg(long, value_name = "VAR")]
    pub env: Option<String>,

    /// How layers are merged.
    #[arg(long, value_enum, default_value_t = MergeStrategy::Shallow)]
    pub merge: MergeStrategy,

    /// Copy the defaults file to the local config path on first use.
    #[arg(long, default_value_t = false)]
    pub clone: bool,

    /// Config file format.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Reject unknown options from the environment and command line too.
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// The application's command line.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl Cli {
    /// Build resolution options from the parsed flags.
    pub fn resolve_options(&self) -> ResolveOptions {
        let ancestors = match self.ancestors.as_deref() {
            None => Ancestors::Off,
            Some("") => Ancestors::On,
            Some(name) => Ancestors::Named(name.to_string()),
        };

        ResolveOptions {
            config_file: self.config_file.clone(),
            local_path: self.local.clone(),
            ancestors,
            env: self.env.clone(),
            clone: self.clone,
            merge: self.merge,
            parser: Box::new(self.format),
            argv: Some(self.args.clone()),
            strict_args: self.strict,
            ..ResolveOptions::new(&self.dir)
        }
    }
}
