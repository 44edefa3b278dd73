//! Config file reading: BOM and comment stripping plus pluggable parsing.
//!
//! Every file layer goes through [`read_config_file`]. A missing file is an
//! empty layer, which makes each layer optional without special casing in
//! the orchestrator.

use std::path::Path;

use serde_json::{Map, Value};
use strum::{Display, EnumString};
use tracing::debug;

use super::error::ConfigError;

/// Turns preprocessed config text into a JSON-compatible value.
///
/// Errors are plain messages; the reader wraps them with the file path.
pub trait ConfigParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Value, String>;

    /// Whether `//` and `/* */` comments are blanked before [`parse`](Self::parse).
    fn strips_comments(&self) -> bool {
        true
    }
}

/// Built-in config text formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, clap::ValueEnum)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Format {
    #[default]
    Json,
    Yaml,
    Toml,
}

impl ConfigParser for Format {
    fn parse(&self, text: &str) -> Result<Value, String> {
        match self {
            Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml_ng::from_str(text).map_err(|e| e.to_string()),
            Format::Toml => {
                let table: toml::Table = toml::from_str(text).map_err(|e| e.to_string())?;
                serde_json::to_value(table).map_err(|e| e.to_string())
            }
        }
    }

    // YAML and TOML bring their own comment syntax.
    fn strips_comments(&self) -> bool {
        matches!(self, Format::Json)
    }
}

/// Read a config file into a mapping.
///
/// Returns an empty mapping when `path` is not an existing file. Otherwise
/// strips a leading BOM (and comments, if the parser wants that) before
/// handing the text to `parser`.
/// A `null` document (e.g. an empty YAML file) is treated as empty.
pub fn read_config_file(
    parser: &dyn ConfigParser,
    path: &Path,
) -> Result<Map<String, Value>, ConfigError> {
    if !path.is_file() {
        debug!(path = %path.display(), "config file not found, using empty layer");
        return Ok(Map::new());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let value = parse_text(parser, &content).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    into_mapping(value, &path.display().to_string())
}

/// Strip a BOM, and comments where the parser asks for it, then parse.
pub fn parse_text(parser: &dyn ConfigParser, text: &str) -> Result<Value, String> {
    let text = strip_bom(text);
    if parser.strips_comments() {
        parser.parse(&strip_comments(text))
    } else {
        parser.parse(text)
    }
}

/// Require a parsed layer to be a mapping. `null` counts as an empty one.
pub fn into_mapping(value: Value, source_name: &str) -> Result<Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ConfigError::NotAMapping {
            source_name: source_name.to_string(),
            found: kind_of(&other).to_string(),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

/// Remove a single leading byte-order mark.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}

/// Blank out `//` line comments and `/* */` block comments.
///
/// Comment characters are replaced by spaces (newlines are kept) so that
/// parser error positions still line up with the original file. Comment
/// markers inside string literals are left alone.
pub fn strip_comments(text: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Code,
        Str,
        Line,
        Block,
    }

    let mut out = String::with_capacity(text.len());
    let mut state = State::Code;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match (c, chars.peek().copied()) {
                ('"', _) => {
                    state = State::Str;
                    out.push(c);
                }
                ('/', Some('/')) => {
                    chars.next();
                    state = State::Line;
                    out.push_str("  ");
                }
                ('/', Some('*')) => {
                    chars.next();
                    state = State::Block;
                    out.push_str("  ");
                }
                _ => out.push(c),
            },
            State::Str => {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == '"' {
                    state = State::Code;
                }
            }
            State::Line => {
                if c == '\n' || c == '\r' {
                    state = State::Code;
                    out.push(c);
                } else {
                    out.push(' ');
                }
            }
            State::Block => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                    out.push_str("  ");
                } else if c == '\n' || c == '\r' {
                    out.push(c);
                } else {
                    out.push(' ');
                }
            }
        }
    }

    out
}
