//! Commands of the `cliconf` binary.
//!
//! Each command receives the resolved configuration and the words left
//! after the command name.

pub mod args;

use anyhow::{Result, bail};
use colored::Colorize;
use serde_json::{Map, Value};

use cliconf::command::CommandTree;
use cliconf::config::LayerPaths;

/// Handler signature shared by every command.
pub type Handler<'a> = Box<dyn Fn(&Map<String, Value>, &[String]) -> Result<()> + 'a>;

/// Build the command tree for a resolution that consults `paths`.
pub fn command_tree(paths: LayerPaths) -> CommandTree<Handler<'static>> {
    CommandTree::new()
        .command("show", Box::new(show) as Handler<'static>)
        .command("layers", Box::new(move |_: &Map<String, Value>, _: &[String]| -> Result<()> {
            print_layers(&paths);
            Ok(())
        }))
        .command("help", Box::new(help))
}

/// Print the resolved configuration, or one dotted key of it.
fn show(config: &Map<String, Value>, args: &[String]) -> Result<()> {
    let value = match args.first() {
        Some(key) => match lookup(config, key) {
            Some(value) => value.clone(),
            None => bail!("no configuration value at '{key}'"),
        },
        None => Value::Object(config.clone()),
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Find `a.b.0.c` style keys, indexing arrays by position.
pub fn lookup<'a>(config: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let mut current = config.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn print_layers(paths: &LayerPaths) {
    let rows = [
        ("package", &paths.package_file),
        ("defaults", &paths.defaults_file),
        ("local", &paths.local_file),
    ];
    for (label, path) in rows.into_iter().chain(paths.ancestors.iter().map(|p| ("ancestor", p))) {
        let marker = if path.is_file() {
            "✔".green().bold()
        } else {
            "✖".dimmed()
        };
        println!("  {marker} {:<9} {}", label.cyan(), path.display());
    }
}

fn help(_config: &Map<String, Value>, args: &[String]) -> Result<()> {
    if let Some(word) = args.first() {
        eprintln!("{} unknown command '{word}'", "warning:".yellow().bold());
    }
    println!("{}", "Commands:".bold());
    println!("  {}  print the resolved configuration (or one dotted KEY)", "show [KEY]".cyan());
    println!("  {}      list the config files consulted, in merge order", "layers".cyan());
    println!("  {}        show this message", "help".cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> Map<String, Value> {
        match json!({"db": {"hosts": ["a", {"name": "b"}]}, "port": 80}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn lookup_walks_objects_and_arrays() {
        let config = config();
        assert_eq!(lookup(&config, "port"), Some(&json!(80)));
        assert_eq!(lookup(&config, "db.hosts.1.name"), Some(&json!("b")));
        assert_eq!(lookup(&config, "db.hosts.9"), None);
        assert_eq!(lookup(&config, "port.x"), None);
        assert_eq!(lookup(&config, "missing"), None);
    }

    #[test]
    fn show_unknown_key_fails() {
        let err = show(&config(), &["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn tree_has_every_command() {
        let paths = LayerPaths {
            package_file: "package.json".into(),
            defaults_file: ".x.json".into(),
            local_file: "~/.x.json".into(),
            ancestors: vec![],
        };
        let tree = command_tree(paths);
        assert_eq!(tree.words().collect::<Vec<_>>(), vec!["show", "layers", "help"]);
        assert!(tree.help().is_some());
    }
}
