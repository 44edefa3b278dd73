//! End-to-end tests for layered configuration resolution.
//!
//! Each test builds an application directory (package.json + defaults), a
//! fake home directory and a working directory under a temp dir, and
//! resolves through the public API with an injected environment.

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use cliconf::config::{Ancestors, ConfigError, MergeStrategy, ResolveOptions, Violation, resolve};
use cliconf::constants::{ENV_HOME, ENV_USERPROFILE};
use cliconf::env::Env;

struct App {
    _root: tempfile::TempDir,
    dir: PathBuf,
    home: PathBuf,
    work: PathBuf,
}

impl App {
    fn new(defaults: Value) -> Self {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("app");
        let home = root.path().join("home");
        let work = root.path().join("work").join("nested1").join("nested2");
        for d in [&dir, &home, &work] {
            std::fs::create_dir_all(d).unwrap();
        }
        write_json(&dir.join("package.json"), &json!({"name": "demo", "version": "0.3.0"}));
        write_json(&dir.join(".demo.json"), &defaults);
        Self {
            _root: root,
            dir,
            home,
            work,
        }
    }

    fn home_file(&self) -> PathBuf {
        self.home.join(".demo.json")
    }

    fn options(&self, argv: &[&str]) -> ResolveOptions {
        let home = self.home.to_string_lossy().into_owned();
        ResolveOptions {
            argv: Some(argv.iter().map(|a| a.to_string()).collect()),
            cwd: Some(self.work.clone()),
            env_reader: Env::mock([(ENV_HOME, home.clone()), (ENV_USERPROFILE, home)]),
            ..ResolveOptions::new(&self.dir)
        }
    }
}

fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

// ---------------------------------------------------------------------------
// precedence
// ---------------------------------------------------------------------------

#[test]
fn local_file_and_cli_override_defaults() {
    let app = App::new(json!({"a": 1, "b": 2, "_schema": "v1"}));
    write_json(&app.home_file(), &json!({"b": 3, "_schema": "v1"}));

    let config = resolve(&app.options(&["--c", "4"])).unwrap();

    assert_eq!(config["a"], json!(1));
    assert_eq!(config["b"], json!(3));
    assert_eq!(config["c"], json!(4));
    assert_eq!(config["_"], json!([]));
    assert_eq!(config["_pkg"], json!({"name": "demo", "version": "0.3.0"}));
}

#[test]
fn every_layer_in_order() {
    let app = App::new(json!({
        "home": 0, "outer": 0, "inner": 0, "env": 0, "cli": 0, "override": 0,
        "_schema": "v1"
    }));
    write_json(&app.home_file(), &json!({"home": 1, "outer": 1, "_schema": "v1"}));
    let outer = app.work.parent().unwrap().parent().unwrap();
    write_json(&outer.join(".demo.json"), &json!({"outer": 2, "inner": 2, "_schema": "v1"}));
    write_json(&app.work.join(".demo.json"), &json!({"inner": 3, "env": 3, "_schema": "v1"}));

    let home = app.home.to_string_lossy().into_owned();
    let mut opts = app.options(&["--cli", "5", "--override", "5", "deploy"]);
    opts.ancestors = Ancestors::On;
    opts.env = Some("DEMO_CONFIG".to_string());
    opts.env_reader = Env::mock([
        (ENV_HOME.to_string(), home.clone()),
        (ENV_USERPROFILE.to_string(), home),
        ("DEMO_CONFIG".to_string(), r#"{"env": 4, "cli": 4}"#.to_string()),
    ]);
    let mut overrides = serde_json::Map::new();
    overrides.insert("override".to_string(), json!(6));
    opts.overrides = Some(overrides);

    let config = resolve(&opts).unwrap();
    assert_eq!(config["home"], json!(1));
    assert_eq!(config["outer"], json!(2));
    assert_eq!(config["inner"], json!(3));
    assert_eq!(config["env"], json!(4));
    assert_eq!(config["cli"], json!(5));
    assert_eq!(config["override"], json!(6));
    assert_eq!(config["_"], json!(["deploy"]));
}

#[test]
fn deep_and_shallow_strategies_differ() {
    let app = App::new(json!({"server": {"host": "localhost", "port": 80}, "_schema": "v1"}));
    write_json(&app.home_file(), &json!({"server": {"port": 8080}, "_schema": "v1"}));

    let mut opts = app.options(&[]);
    opts.merge = MergeStrategy::Deep;
    assert_eq!(
        resolve(&opts).unwrap()["server"],
        json!({"host": "localhost", "port": 8080})
    );

    opts.merge = MergeStrategy::Shallow;
    assert_eq!(resolve(&opts).unwrap()["server"], json!({"port": 8080}));
}

#[test]
fn cli_dotted_flags_deep_merge_into_defaults() {
    let app = App::new(json!({"server": {"host": "localhost", "port": 80}}));
    let mut opts = app.options(&["--server.port", "9000"]);
    opts.merge = MergeStrategy::Deep;
    assert_eq!(
        resolve(&opts).unwrap()["server"],
        json!({"host": "localhost", "port": 9000})
    );
}

// ---------------------------------------------------------------------------
// validation
// ---------------------------------------------------------------------------

#[test]
fn missing_schema_in_local_file_is_fatal() {
    let app = App::new(json!({"a": 1, "_schema": "v1"}));
    write_json(&app.home_file(), &json!({"a": 2}));

    let err = resolve(&app.options(&["--a", "3"])).unwrap_err();
    let msg = err.to_string();
    match err {
        ConfigError::InvalidLayer { layer, violations, reference } => {
            assert_eq!(layer, app.home_file().display().to_string());
            assert_eq!(violations, vec![Violation::SchemaUndefined]);
            assert_eq!(reference, Some(app.dir.join(".demo.json")));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(msg.contains("_schema property is not defined"), "got: {msg}");
}

#[test]
fn changed_schema_in_local_file_is_fatal() {
    let app = App::new(json!({"a": 1, "_schema": "v2"}));
    write_json(&app.home_file(), &json!({"a": 2, "_schema": "v1"}));

    let err = resolve(&app.options(&[])).unwrap_err();
    assert!(err.to_string().contains("Schema has changed"), "got: {err}");
}

#[test]
fn unknown_key_in_local_file_is_fatal() {
    let app = App::new(json!({"a": 1, "_schema": "v1"}));
    write_json(&app.home_file(), &json!({"z": 2, "_schema": "v1"}));

    let err = resolve(&app.options(&[])).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("'z': is an invalid option."), "got: {msg}");
    assert!(msg.contains("Please update based on example in"), "got: {msg}");
}

#[test]
fn cli_may_introduce_ad_hoc_keys() {
    let app = App::new(json!({"a": 1, "_schema": "v1"}));
    let config = resolve(&app.options(&["--verbose"])).unwrap();
    assert_eq!(config["verbose"], json!(true));
}

// ---------------------------------------------------------------------------
// file handling
// ---------------------------------------------------------------------------

#[test]
fn invalid_local_file_reports_path() {
    let app = App::new(json!({"a": 1}));
    std::fs::write(app.home_file(), "{ \"a\": [ }").unwrap();

    let err = resolve(&app.options(&[])).unwrap_err();
    let expected_prefix = format!(
        "{}: Failed to read configuration file. ",
        app.home_file().display()
    );
    assert!(err.to_string().starts_with(&expected_prefix), "got: {err}");
}

#[test]
fn commented_config_with_bom_is_accepted() {
    let app = App::new(json!({"a": 1, "_schema": "v1"}));
    std::fs::write(
        app.home_file(),
        "\u{FEFF}/* user settings */\n{\n  \"a\": 2, // override\n  \"_schema\": \"v1\"\n}\n",
    )
    .unwrap();

    assert_eq!(resolve(&app.options(&[])).unwrap()["a"], json!(2));
}

#[test]
fn clone_creates_local_file_once() {
    let app = App::new(json!({"a": 1, "_schema": "v1"}));
    let mut opts = app.options(&[]);
    opts.clone = true;

    assert!(!app.home_file().exists());
    resolve(&opts).unwrap();
    let copied = std::fs::read_to_string(app.home_file()).unwrap();
    let shipped = std::fs::read_to_string(app.dir.join(".demo.json")).unwrap();
    assert_eq!(copied, shipped);

    write_json(&app.home_file(), &json!({"a": 7, "_schema": "v1"}));
    assert_eq!(resolve(&opts).unwrap()["a"], json!(7));
}

#[test]
fn config_file_option_renames_every_file() {
    let app = App::new(json!({}));
    write_json(&app.dir.join("settings.json"), &json!({"a": 1, "_schema": "v1"}));
    write_json(&app.home.join("settings.json"), &json!({"a": 2, "_schema": "v1"}));

    let mut opts = app.options(&[]);
    opts.config_file = Some("settings.json".to_string());
    assert_eq!(resolve(&opts).unwrap()["a"], json!(2));
}
