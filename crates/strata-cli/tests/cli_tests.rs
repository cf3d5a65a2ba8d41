//! Integration tests for the `strata` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MANIFEST: &str = r#"
name = "service"
description = "Small service skeleton"

[[questions]]
name = "flavor"
message = "Flavor?"
kind = "select"
choices = ["__template.strict", "plain"]
default = "plain"

[files]
merge = ["*.json", "*.md"]

[[extends]]
label = "strict"

[[components]]
name = "docker"
"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn template() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "template.toml", MANIFEST);
    write(root, "template/README.md", "# service\n");
    write(root, "template/config.json", "{\"strict\": false}\n");
    write(root, "extends/strict/config.json", "{\"strict\": true}\n");
    write(root, "components/docker/Dockerfile", "FROM scratch\n");
    dir
}

/// A `strata` command isolated from the user's config and cache.
fn strata(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_CACHE_HOME", home.path().join("cache"))
        .env_remove("RUST_LOG")
        .env_remove("STRATA_GENERATE__STRATEGY");
    cmd
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    strata(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn version_flag() {
    let home = TempDir::new().unwrap();
    strata(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn completions_for_bash() {
    let home = TempDir::new().unwrap();
    strata(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("strata"));
}

#[test]
fn generate_with_defaults_writes_main_layer() {
    let home = TempDir::new().unwrap();
    let tpl = template();
    let dest = home.path().join("out");

    strata(&home)
        .args(["generate", "--yes", tpl.path().to_str().unwrap(), "out"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(dest.join("config.json")).unwrap(),
        "{\"strict\": false}\n"
    );
    assert!(dest.join("README.md").exists());
    assert!(!dest.join("Dockerfile").exists());
}

#[test]
fn unresolved_conflicts_exit_with_code_5() {
    let home = TempDir::new().unwrap();
    let tpl = template();

    strata(&home)
        .args(["generate", "--yes", "-a", "flavor=__template.strict"])
        .args([tpl.path().to_str().unwrap(), "out"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("config.json"));

    let written = fs::read_to_string(home.path().join("out/config.json")).unwrap();
    assert!(written.contains("<<<<<<< former"));
}

#[test]
fn keep_current_strategy_resolves_conflicts() {
    let home = TempDir::new().unwrap();
    let tpl = template();

    strata(&home)
        .args(["generate", "--yes", "-a", "flavor=__template.strict"])
        .args(["--strategy", "keep-current", "-C", "docker"])
        .args([tpl.path().to_str().unwrap(), "out"])
        .assert()
        .success();

    let out = home.path().join("out");
    assert_eq!(
        fs::read_to_string(out.join("config.json")).unwrap(),
        "{\"strict\": true}\n"
    );
    assert!(out.join("Dockerfile").exists());
}

#[test]
fn existing_destination_is_refused() {
    let home = TempDir::new().unwrap();
    let tpl = template();
    fs::create_dir(home.path().join("out")).unwrap();

    strata(&home)
        .args(["generate", "--yes", tpl.path().to_str().unwrap(), "out"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn upgrade_keeps_user_edits() {
    let home = TempDir::new().unwrap();
    let tpl = template();
    let out = home.path().join("out");
    write(&out, "README.md", "# service\nlocal notes\n");

    strata(&home)
        .args(["generate", "--yes", "--upgrade", tpl.path().to_str().unwrap(), "out"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(out.join("README.md")).unwrap(),
        "# service\nlocal notes\n"
    );
    assert!(out.join("config.json").exists());
}

#[test]
fn dry_run_writes_nothing() {
    let home = TempDir::new().unwrap();
    let tpl = template();

    strata(&home)
        .args(["generate", "--yes", "--dry-run", tpl.path().to_str().unwrap(), "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("README.md"));

    assert!(!home.path().join("out").exists());
}

#[test]
fn missing_template_exits_with_code_3() {
    let home = TempDir::new().unwrap();

    strata(&home)
        .args(["generate", "--yes", "no-such-template", "out"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("no-such-template"));
}

#[test]
fn unknown_component_is_rejected() {
    let home = TempDir::new().unwrap();
    let tpl = template();

    strata(&home)
        .args(["generate", "--yes", "-C", "kafka", tpl.path().to_str().unwrap(), "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("kafka"));

    assert!(!home.path().join("out").exists());
}

#[test]
fn plan_prints_layer_order() {
    let home = TempDir::new().unwrap();
    let tpl = template();

    strata(&home)
        .args(["plan", "--yes", "-a", "flavor=__template.strict", "-C", "docker"])
        .arg(tpl.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("main"))
        .stdout(predicate::str::contains("extend:strict"))
        .stdout(predicate::str::contains("component:docker"));
}

#[test]
fn plan_as_json() {
    let home = TempDir::new().unwrap();
    let tpl = template();

    let output = strata(&home)
        .args(["--output-format", "json", "plan", "--yes"])
        .arg(tpl.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["template"], "service");
    assert_eq!(value["layers"], serde_json::json!(["main"]));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("strata.toml");
    fs::write(&file, "").unwrap();

    strata(&home)
        .args(["--config", file.to_str().unwrap()])
        .args(["config", "set", "generate.strategy", "keep-former"])
        .assert()
        .success();

    strata(&home)
        .args(["--config", file.to_str().unwrap()])
        .args(["config", "get", "generate.strategy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keep-former"));
}

#[test]
fn env_overrides_config() {
    let home = TempDir::new().unwrap();

    strata(&home)
        .env("STRATA_LOADER__MAX_RETRIES", "9")
        .args(["config", "get", "loader.max_retries"])
        .assert()
        .success()
        .stdout(predicate::str::contains("9"));
}
