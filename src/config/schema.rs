//! Schema drift and unknown-option checks for config layers.
//!
//! The defaults file that ships with the application is the schema: its
//! `_schema` tag versions the file format and its top-level keys are the
//! only options a config file may set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::error::{ConfigError, Violation};
use crate::constants::{ARGS_KEY, PKG_KEY, SCHEMA_KEY};

/// Extra, caller-supplied validation run after the built-in checks.
pub trait LayerValidator: Send + Sync {
    /// Reject `config` (from the layer named `layer`) by returning a message.
    fn validate(&self, layer: &str, config: &Map<String, Value>, is_file: bool) -> Result<(), String>;
}

/// Validate one layer against the defaults schema.
///
/// File layers must carry a `_schema` equal to `defaults_schema` when the
/// defaults declare one. Every layer is checked for top-level keys missing
/// from `defaults_keys` (reserved keys excepted). All violations of one
/// layer are reported together; file layers point at `defaults_file`.
pub fn validate_layer(
    defaults_schema: Option<&Value>,
    defaults_keys: &HashSet<String>,
    layer: &Map<String, Value>,
    layer_name: &str,
    is_file: bool,
    defaults_file: &Path,
) -> Result<(), ConfigError> {
    if layer.is_empty() {
        return Ok(());
    }

    let mut violations = Vec::new();

    if is_file {
        if let Some(expected) = defaults_schema {
            match layer.get(SCHEMA_KEY) {
                None | Some(Value::Null) => violations.push(Violation::SchemaUndefined),
                Some(found) if found != expected => violations.push(Violation::SchemaChanged),
                Some(_) => {}
            }
        }
    }

    violations.extend(
        layer
            .keys()
            .filter(|key| !is_reserved(key) && !defaults_keys.contains(key.as_str()))
            .map(|key| Violation::UnknownKey(key.clone())),
    );

    if violations.is_empty() {
        return Ok(());
    }

    Err(ConfigError::InvalidLayer {
        layer: layer_name.to_string(),
        violations,
        reference: is_file.then(|| defaults_file.to_path_buf()),
    })
}

fn is_reserved(key: &str) -> bool {
    key == ARGS_KEY || key == PKG_KEY
}

/// The schema established by the defaults file, reused for every later layer.
#[derive(Debug, Clone)]
pub struct Schema {
    defaults_file: PathBuf,
    tag: Option<Value>,
    keys: HashSet<String>,
}

impl Schema {
    /// Capture the tag and key set of the loaded defaults.
    pub fn from_defaults(defaults_file: &Path, defaults: &Map<String, Value>) -> Self {
        Self {
            defaults_file: defaults_file.to_path_buf(),
            tag: defaults.get(SCHEMA_KEY).filter(|v| !v.is_null()).cloned(),
            keys: defaults.keys().cloned().collect(),
        }
    }

    /// The `_schema` tag, if the defaults declare one.
    pub fn tag(&self) -> Option<&Value> {
        self.tag.as_ref()
    }

    pub fn validate(
        &self,
        layer: &Map<String, Value>,
        layer_name: &str,
        is_file: bool,
    ) -> Result<(), ConfigError> {
        validate_layer(
            self.tag.as_ref(),
            &self.keys,
            layer,
            layer_name,
            is_file,
            &self.defaults_file,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn schema() -> Schema {
        Schema::from_defaults(
            Path::new("/opt/app/.app.json"),
            &map(json!({"a": 1, "b": 2, "_schema": "v1"})),
        )
    }

    fn violations(err: ConfigError) -> Vec<Violation> {
        match err {
            ConfigError::InvalidLayer { violations, .. } => violations,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_layer_is_always_valid() {
        assert!(schema().validate(&Map::new(), "~/.app.json", true).is_ok());
    }

    #[test]
    fn matching_file_layer_is_valid() {
        let layer = map(json!({"b": 3, "_schema": "v1"}));
        assert!(schema().validate(&layer, "~/.app.json", true).is_ok());
    }

    #[test]
    fn missing_schema_is_reported() {
        let layer = map(json!({"b": 3}));
        let err = schema().validate(&layer, "~/.app.json", true).unwrap_err();
        assert_eq!(violations(err), vec![Violation::SchemaUndefined]);
    }

    #[test]
    fn changed_schema_is_reported() {
        let layer = map(json!({"b": 3, "_schema": "v0"}));
        let err = schema().validate(&layer, "~/.app.json", true).unwrap_err();
        assert_eq!(violations(err), vec![Violation::SchemaChanged]);
    }

    #[test]
    fn all_violations_are_collected() {
        let layer = map(json!({"z": 1, "b": 3, "y": 2}));
        let err = schema().validate(&layer, "~/.app.json", true).unwrap_err();
        let msg = err.to_string();
        assert_eq!(
            violations(err),
            vec![
                Violation::SchemaUndefined,
                Violation::UnknownKey("z".to_string()),
                Violation::UnknownKey("y".to_string()),
            ]
        );
        assert!(msg.contains("Please update based on example in\n  /opt/app/.app.json"));
    }

    #[test]
    fn non_file_layers_skip_schema_but_check_keys() {
        let layer = map(json!({"b": 3}));
        assert!(schema().validate(&layer, "$APP_CONFIG", false).is_ok());

        let layer = map(json!({"verbose": true}));
        let err = schema().validate(&layer, "command line args", false).unwrap_err();
        assert!(!err.to_string().contains("Please update"));
        assert_eq!(violations(err), vec![Violation::UnknownKey("verbose".to_string())]);
    }

    #[test]
    fn reserved_keys_are_exempt() {
        let layer = map(json!({"_": ["show"], "_pkg": {}, "a": 2}));
        assert!(schema().validate(&layer, "command line args", false).is_ok());
    }

    #[test]
    fn defaults_without_schema_tag_skip_schema_check() {
        let schema = Schema::from_defaults(Path::new("d.json"), &map(json!({"a": 1})));
        assert!(schema.tag().is_none());
        assert!(schema.validate(&map(json!({"a": 2})), "local", true).is_ok());
    }
}
