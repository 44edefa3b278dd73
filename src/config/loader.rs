//! Layered configuration resolution.
//!
//! Priority (lowest to highest):
//! 1. Package defaults (`<dirname>/<config file>`), with `package.json` under `_pkg`
//! 2. Local config file (`~/<config file>` or an explicit path)
//! 3. Config files in the current and ancestor directories, root first
//! 4. An environment variable holding a serialized layer
//! 5. Command line arguments
//! 6. Caller overrides

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::ancestors::find_ancestor_config_files_from;
use super::error::ConfigError;
use super::merge::MergeStrategy;
use super::reader::{ConfigParser, Format, into_mapping, parse_text, read_config_file};
use super::schema::{LayerValidator, Schema};
use crate::argv::{ArgsOptions, parse_args};
use crate::constants::{APP_NAME, PACKAGE_FILENAME, PKG_KEY};
use crate::env::Env;
use crate::paths::expand_home;

/// Layer name used for the tokenized argument vector.
pub const CLI_LAYER: &str = "command line args";

/// Layer name used for caller overrides.
pub const OVERRIDE_LAYER: &str = "options.override";

/// Whether, and for which file name, ancestor directories are searched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Ancestors {
    #[default]
    Off,
    /// Search for the configured config file name.
    On,
    /// Search for a different file name.
    Named(String),
}

impl Ancestors {
    fn file_name<'a>(&'a self, config_name: &'a str) -> Option<&'a str> {
        match self {
            Ancestors::Off => None,
            Ancestors::On => Some(config_name),
            Ancestors::Named(name) => Some(name.as_str()),
        }
    }
}

impl From<bool> for Ancestors {
    fn from(enabled: bool) -> Self {
        if enabled { Ancestors::On } else { Ancestors::Off }
    }
}

impl From<&str> for Ancestors {
    fn from(name: &str) -> Self {
        Ancestors::Named(name.to_string())
    }
}

/// Inputs to [`resolve`].
pub struct ResolveOptions {
    /// Directory holding `package.json` and the defaults file.
    pub dirname: PathBuf,
    /// Config file name; defaults to `.<package name>.json`.
    pub config_file: Option<String>,
    /// Explicit local config path, used instead of `~/<config file>`.
    pub local_path: Option<PathBuf>,
    pub ancestors: Ancestors,
    /// Environment variable whose value is a serialized config layer.
    pub env: Option<String>,
    /// Copy the defaults file to the local path on first use.
    pub clone: bool,
    pub merge: MergeStrategy,
    /// Final layer, applied after everything else.
    pub overrides: Option<Map<String, Value>>,
    pub parser: Box<dyn ConfigParser>,
    pub validator: Option<Box<dyn LayerValidator>>,
    /// Arguments to tokenize; defaults to the process arguments.
    pub argv: Option<Vec<String>>,
    pub args: ArgsOptions,
    /// Start directory for the ancestor search; defaults to the working directory.
    pub cwd: Option<PathBuf>,
    /// Also reject unknown top-level keys from env, CLI and override layers.
    pub strict_args: bool,
    pub env_reader: Env,
}

impl ResolveOptions {
    pub fn new(dirname: impl Into<PathBuf>) -> Self {
        Self {
            dirname: dirname.into(),
            ..Self::default()
        }
    }

    /// Work out which files resolution would consult.
    pub fn layer_paths(&self) -> Result<LayerPaths, ConfigError> {
        let package_file = self.dirname.join(PACKAGE_FILENAME);
        let pkg = read_config_file(&Format::Json, &package_file)?;
        Ok(self.locate(&pkg))
    }

    fn locate(&self, pkg: &Map<String, Value>) -> LayerPaths {
        let config_name = self
            .config_file
            .clone()
            .unwrap_or_else(|| format!(".{}.json", self.package_name(pkg)));

        let local_file = match &self.local_path {
            Some(path) => expand_home(&path.to_string_lossy(), &self.env_reader),
            None => expand_home(&format!("~/{config_name}"), &self.env_reader),
        };

        let ancestors = match self.ancestors.file_name(&config_name) {
            Some(name) => {
                let start = self.cwd.as_deref().unwrap_or(Path::new("."));
                find_ancestor_config_files_from(start, name)
            }
            None => Vec::new(),
        };

        LayerPaths {
            package_file: self.dirname.join(PACKAGE_FILENAME),
            defaults_file: self.dirname.join(&config_name),
            local_file,
            ancestors,
        }
    }

    /// `name` from `package.json`, else the application directory's name.
    fn package_name(&self, pkg: &Map<String, Value>) -> String {
        pkg.get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .or_else(|| {
                self.dirname
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| APP_NAME.to_string())
    }

    fn check(&self, layer: &str, config: &Map<String, Value>, is_file: bool) -> Result<(), ConfigError> {
        match &self.validator {
            Some(validator) => validator
                .validate(layer, config, is_file)
                .map_err(|message| ConfigError::Validator {
                    layer: layer.to_string(),
                    message,
                }),
            None => Ok(()),
        }
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            dirname: PathBuf::from("."),
            config_file: None,
            local_path: None,
            ancestors: Ancestors::Off,
            env: None,
            clone: false,
            merge: MergeStrategy::Shallow,
            overrides: None,
            parser: Box::new(Format::Json),
            validator: None,
            argv: None,
            args: ArgsOptions::default(),
            cwd: None,
            strict_args: false,
            env_reader: Env::real(),
        }
    }
}

impl fmt::Debug for ResolveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("dirname", &self.dirname)
            .field("config_file", &self.config_file)
            .field("local_path", &self.local_path)
            .field("ancestors", &self.ancestors)
            .field("env", &self.env)
            .field("clone", &self.clone)
            .field("merge", &self.merge)
            .field("overrides", &self.overrides)
            .field("validator", &self.validator.as_ref().map(|_| "[custom]"))
            .field("argv", &self.argv)
            .field("args", &self.args)
            .field("cwd", &self.cwd)
            .field("strict_args", &self.strict_args)
            .finish()
    }
}

/// Files consulted during resolution, in merge order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPaths {
    pub package_file: PathBuf,
    pub defaults_file: PathBuf,
    pub local_file: PathBuf,
    /// Existing ancestor config files, root first.
    pub ancestors: Vec<PathBuf>,
}

/// Resolve the merged configuration.
///
/// Any parse or validation failure aborts resolution; there is no partial
/// result.
pub fn resolve(options: &ResolveOptions) -> Result<Map<String, Value>, ConfigError> {
    let parser = options.parser.as_ref();
    let merge = options.merge;

    let package_file = options.dirname.join(PACKAGE_FILENAME);
    let pkg = read_config_file(&Format::Json, &package_file)?;
    let paths = options.locate(&pkg);

    // Defaults seed the accumulator and define the schema for every later layer.
    let defaults = read_config_file(parser, &paths.defaults_file)?;
    options.check(&paths.defaults_file.display().to_string(), &defaults, true)?;
    let schema = Schema::from_defaults(&paths.defaults_file, &defaults);
    debug!(
        path = %paths.defaults_file.display(),
        keys = defaults.len(),
        schema = ?schema.tag(),
        "loaded package defaults"
    );

    let mut config = Map::new();
    merge.apply(&mut config, defaults);
    config.insert(PKG_KEY.to_string(), Value::Object(pkg));

    if options.clone {
        clone_defaults(&paths.defaults_file, &paths.local_file)?;
    }

    let mut layers = vec![paths.local_file.clone()];
    layers.extend(paths.ancestors.iter().cloned());
    for path in &layers {
        let layer = read_config_file(parser, path)?;
        let name = path.display().to_string();
        schema.validate(&layer, &name, true)?;
        options.check(&name, &layer, true)?;
        debug!(path = %name, keys = layer.len(), "merging config file");
        merge.apply(&mut config, layer);
    }

    if let Some(var) = &options.env {
        match options.env_reader.var(var) {
            Ok(text) if !text.trim().is_empty() => {
                let name = format!("${var}");
                let value = parse_text(parser, &text).map_err(|message| ConfigError::ParseEnv {
                    name: var.clone(),
                    message,
                })?;
                let layer = into_mapping(value, &name)?;
                merge_loose_layer(options, &schema, &mut config, layer, &name)?;
            }
            _ => debug!(var = %var, "environment layer not set, skipping"),
        }
    }

    let argv = options
        .argv
        .clone()
        .unwrap_or_else(|| std::env::args().skip(1).collect());
    let cli = parse_args(&argv, &options.args);
    merge_loose_layer(options, &schema, &mut config, cli, CLI_LAYER)?;

    if let Some(overrides) = &options.overrides {
        merge_loose_layer(options, &schema, &mut config, overrides.clone(), OVERRIDE_LAYER)?;
    }

    Ok(config)
}

/// Validate and merge a layer that did not come from a config file.
fn merge_loose_layer(
    options: &ResolveOptions,
    schema: &Schema,
    config: &mut Map<String, Value>,
    layer: Map<String, Value>,
    name: &str,
) -> Result<(), ConfigError> {
    if options.strict_args {
        schema.validate(&layer, name, false)?;
    }
    options.check(name, &layer, false)?;
    debug!(layer = %name, keys = layer.len(), "merging layer");
    options.merge.apply(config, layer);
    Ok(())
}

/// Copy the defaults file to `local_file` unless something is already there.
fn clone_defaults(defaults_file: &Path, local_file: &Path) -> Result<(), ConfigError> {
    if local_file.exists() {
        return Ok(());
    }
    if !defaults_file.is_file() {
        warn!(path = %defaults_file.display(), "no defaults file to copy");
        return Ok(());
    }

    let content = std::fs::read(defaults_file).map_err(|e| ConfigError::Read {
        path: defaults_file.to_path_buf(),
        source: e,
    })?;

    // create_new refuses to clobber a file that appeared after the check above.
    let mut file = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(local_file)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(()),
        Err(e) => {
            return Err(ConfigError::Write {
                path: local_file.to_path_buf(),
                source: e,
            });
        }
    };
    file.write_all(&content)
        .and_then(|()| file.flush())
        .map_err(|e| ConfigError::Write {
            path: local_file.to_path_buf(),
            source: e,
        })?;

    info!(path = %local_file.display(), "created settings file from defaults");
    println!("{}: Created a settings file", local_file.display());
    Ok(())
}
