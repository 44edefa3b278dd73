//! Layer merging.
//!
//! Shallow merging replaces a key's whole value. Deep merging recurses when
//! both sides are mappings; arrays and scalars are replaced entirely.

use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// How each layer is folded into the accumulated configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, clap::ValueEnum)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MergeStrategy {
    /// Top-level keys from the incoming layer overwrite existing ones.
    #[default]
    Shallow,
    /// Nested mappings are merged field by field.
    Deep,
}

impl MergeStrategy {
    /// Merge `incoming` into `base` using this strategy.
    pub fn apply(self, base: &mut Map<String, Value>, incoming: Map<String, Value>) {
        match self {
            MergeStrategy::Shallow => shallow_merge(base, incoming),
            MergeStrategy::Deep => deep_merge(base, incoming),
        }
    }
}

/// Overwrite keys of `base` with those of `incoming`, one level deep.
pub fn shallow_merge(base: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        base.insert(key, value);
    }
}

/// Merge `incoming` into `base`, recursing where both values are mappings.
///
/// Type mismatches (mapping vs. scalar, array vs. mapping) resolve to the
/// incoming value.
pub fn deep_merge(base: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        match value {
            Value::Object(nested) => match base.get_mut(&key) {
                Some(Value::Object(existing)) => deep_merge(existing, nested),
                _ => {
                    base.insert(key, Value::Object(nested));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}
