//! Argument vector tokenizer.
//!
//! Turns raw process arguments into a mapping of flags plus the positional
//! remainder under `_`, in the style of the `minimist` family of parsers:
//!
//! - `--key=value`, `--key value`, `--key` (true), `--no-key` (false)
//! - `-abc` clusters, `-n5`, `-k=v`
//! - `--` ends flag parsing
//! - numeric-looking values become numbers unless declared as strings
//! - dotted keys (`--db.port=5432`) build nested mappings
//! - repeated flags collect into an array

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::constants::ARGS_KEY;

static LONG_WITH_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^--([^=]+)=(.*)$").unwrap());
static NEGATED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^--no-(.+)$").unwrap());
static LONG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^--(.+)$").unwrap());
static SHORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-[^-]+").unwrap());
static FLAG_LIKE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(-|--)[^-]").unwrap());
static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?$").unwrap());
static HEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^0x([0-9a-f]+)$").unwrap());
static SHORT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(?:\.\d*)?(?:e-?\d+)?$").unwrap());

/// Tokenizer configuration, passed through from the caller unchanged.
#[derive(Debug, Clone, Default)]
pub struct ArgsOptions {
    /// Flags that never take a value.
    pub boolean: Vec<String>,
    /// Flags whose values are never converted to numbers.
    pub string: Vec<String>,
    /// Alternative names per flag, e.g. `v -> [verbose]`.
    pub alias: IndexMap<String, Vec<String>>,
    /// Values for flags that do not appear on the command line.
    pub default: Map<String, Value>,
    /// Stop parsing flags at the first positional argument.
    pub stop_early: bool,
}

/// Tokenize `args` (without the program name) into a mapping.
///
/// The result always contains `_`, the positional arguments in order.
pub fn parse_args<S: AsRef<str>>(args: &[S], opts: &ArgsOptions) -> Map<String, Value> {
    Tokenizer::new(opts).run(args)
}

struct Tokenizer<'a> {
    opts: &'a ArgsOptions,
    aliases: HashMap<String, Vec<String>>,
    bools: HashSet<String>,
    strings: HashSet<String>,
    out: Map<String, Value>,
    positional: Vec<Value>,
}

impl<'a> Tokenizer<'a> {
    fn new(opts: &'a ArgsOptions) -> Self {
        let mut aliases: HashMap<String, Vec<String>> = HashMap::new();
        for (key, names) in &opts.alias {
            let group: Vec<&String> = std::iter::once(key).chain(names).collect();
            for name in &group {
                let others = group
                    .iter()
                    .filter(|other| *other != name)
                    .map(|other| (*other).clone());
                let entry = aliases.entry((*name).clone()).or_default();
                for other in others {
                    if !entry.contains(&other) {
                        entry.push(other);
                    }
                }
            }
        }

        let expand = |keys: &[String]| -> HashSet<String> {
            keys.iter()
                .flat_map(|k| {
                    std::iter::once(k.clone())
                        .chain(aliases.get(k).into_iter().flatten().cloned())
                })
                .collect()
        };
        let bools = expand(&opts.boolean);
        let strings = expand(&opts.string);

        Self {
            opts,
            aliases,
            bools,
            strings,
            out: Map::new(),
            positional: Vec::new(),
        }
    }

    fn run<S: AsRef<str>>(mut self, args: &[S]) -> Map<String, Value> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let mut i = 0;

        while i < args.len() {
            let arg = args[i];
            let next = args.get(i + 1).copied();

            if arg == "--" {
                self.positional
                    .extend(args[i + 1..].iter().map(|a| Value::String((*a).to_string())));
                break;
            }

            if let Some(caps) = LONG_WITH_VALUE.captures(arg) {
                let key = &caps[1];
                let raw = &caps[2];
                let value = if self.bools.contains(key) {
                    Value::Bool(raw != "false")
                } else {
                    self.coerce(key, raw)
                };
                self.set_arg(key, value);
            } else if let Some(caps) = NEGATED.captures(arg) {
                self.set_arg(&caps[1], Value::Bool(false));
            } else if let Some(caps) = LONG.captures(arg) {
                let key = caps[1].to_string();
                i += self.take_value(&key, next);
            } else if SHORT.is_match(arg) {
                i += self.short_cluster(arg, next);
            } else {
                self.positional.push(self.coerce(ARGS_KEY, arg));
                if self.opts.stop_early {
                    self.positional
                        .extend(args[i + 1..].iter().map(|a| Value::String((*a).to_string())));
                    break;
                }
            }

            i += 1;
        }

        self.apply_defaults();

        let mut result = Map::new();
        result.insert(ARGS_KEY.to_string(), Value::Array(self.positional));
        result.extend(self.out);
        result
    }

    /// Assign a value to a flag that may consume the following argument.
    /// Returns how many extra arguments were consumed.
    fn take_value(&mut self, key: &str, next: Option<&str>) -> usize {
        match next {
            Some(value) if !FLAG_LIKE.is_match(value) && !self.bools.contains(key) => {
                let value = self.coerce(key, value);
                self.set_arg(key, value);
                1
            }
            Some(value @ ("true" | "false")) => {
                self.set_arg(key, Value::Bool(value == "true"));
                1
            }
            _ => {
                let value = self.flag_only(key);
                self.set_arg(key, value);
                0
            }
        }
    }

    fn short_cluster(&mut self, arg: &str, next: Option<&str>) -> usize {
        let letters: Vec<char> = arg.chars().skip(1).collect();
        let mut broken = false;

        for j in 0..letters.len().saturating_sub(1) {
            let letter = letters[j].to_string();
            let rest: String = letters[j + 1..].iter().collect();

            if rest == "-" {
                self.set_arg(&letter, Value::String(rest));
                continue;
            }
            if letters[j].is_alphabetic() {
                if let Some(value) = rest.strip_prefix('=') {
                    let value = self.coerce(&letter, value);
                    self.set_arg(&letter, value);
                    broken = true;
                    break;
                }
                if SHORT_NUMBER.is_match(&rest) {
                    let value = self.coerce(&letter, &rest);
                    self.set_arg(&letter, value);
                    broken = true;
                    break;
                }
            }
            if !letters[j + 1].is_alphanumeric() && letters[j + 1] != '_' {
                let value = self.coerce(&letter, &rest);
                self.set_arg(&letter, value);
                broken = true;
                break;
            }
            let value = self.flag_only(&letter);
            self.set_arg(&letter, value);
        }

        match letters.last() {
            Some(&last) if !broken && last != '-' => self.take_value(&last.to_string(), next),
            _ => 0,
        }
    }

    fn flag_only(&self, key: &str) -> Value {
        if self.strings.contains(key) {
            Value::String(String::new())
        } else {
            Value::Bool(true)
        }
    }

    fn coerce(&self, key: &str, raw: &str) -> Value {
        if self.strings.contains(key) {
            return Value::String(raw.to_string());
        }
        to_number(raw).unwrap_or_else(|| Value::String(raw.to_string()))
    }

    fn set_arg(&mut self, key: &str, value: Value) {
        let is_bool = self.bools.contains(key);
        set_key(&mut self.out, key, value.clone(), is_bool);
        if let Some(aliases) = self.aliases.get(key).cloned() {
            for alias in aliases {
                let alias_bool = self.bools.contains(&alias);
                set_key(&mut self.out, &alias, value.clone(), alias_bool);
            }
        }
    }

    fn apply_defaults(&mut self) {
        for (key, value) in &self.opts.default {
            let mut names = vec![key.clone()];
            names.extend(self.aliases.get(key).into_iter().flatten().cloned());
            if names.iter().any(|name| has_key(&self.out, name)) {
                continue;
            }
            for name in names {
                set_key(&mut self.out, &name, value.clone(), true);
            }
        }
    }
}

/// Store `value` under a possibly dotted `key`, collecting repeats into an array.
fn set_key(map: &mut Map<String, Value>, key: &str, value: Value, replace: bool) {
    let mut parts: Vec<&str> = key.split('.').collect();
    let last = parts.pop().unwrap_or(key);

    let mut target = map;
    for part in parts {
        let slot = target
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        target = match slot {
            Value::Object(nested) => nested,
            _ => unreachable!("slot was just made an object"),
        };
    }

    match target.get_mut(last) {
        None => {
            target.insert(last.to_string(), value);
        }
        Some(existing) if replace || existing.is_boolean() => *existing = value,
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
    }
}

fn has_key(map: &Map<String, Value>, key: &str) -> bool {
    let mut current = map;
    let mut parts = key.split('.').peekable();
    while let Some(part) = parts.next() {
        match current.get(part) {
            None => return false,
            Some(_) if parts.peek().is_none() => return true,
            Some(Value::Object(nested)) => current = nested,
            Some(_) => return false,
        }
    }
    false
}

/// Convert numeric-looking text the way a JavaScript `Number()` would.
fn to_number(raw: &str) -> Option<Value> {
    if let Some(caps) = HEX.captures(raw) {
        return i64::from_str_radix(&caps[1], 16).ok().map(Value::from);
    }
    if !DECIMAL.is_match(raw) {
        return None;
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::from(int));
    }
    let float: f64 = raw.parse().ok()?;
    if float.fract() == 0.0 && float.abs() < 9_007_199_254_740_992.0 {
        return Some(Value::from(float as i64));
    }
    Number::from_f64(float).map(Value::Number)
}
