//! End-to-end tests of the orla binary against an isolated ORLA_HOME

// Integration tests can use unwrap/expect for cleaner assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn orla(home: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("orla").unwrap();
    cmd.current_dir(home)
        .env("ORLA_HOME", home)
        .env_remove("ORLA_TOOLS_DIR")
        .env_remove("ORLA_REGISTRY_URL")
        .env_remove("ORLA_CACHE_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn write_local_tool(dir: &Path) {
    fs::create_dir_all(dir.join("bin")).unwrap();
    fs::write(dir.join("bin/run"), "#!/bin/sh\necho demo\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir.join("bin/run"), fs::Permissions::from_mode(0o755)).unwrap();
    }
    fs::write(
        dir.join("tool.yaml"),
        "name: demo\nversion: 1.0.0\ndescription: Demo tool\nentrypoint: bin/run\nkeywords: [demo]\n",
    )
    .unwrap();
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    orla(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tool"))
        .stdout(predicate::str::contains("cache"));
}

#[test]
fn test_list_with_nothing_installed() {
    let home = TempDir::new().unwrap();
    orla(home.path())
        .args(["tool", "list"])
        .assert()
        .success()
        .stdout("No tools installed.\nInstall tools with: orla tool install TOOL-NAME\n");

    orla(home.path())
        .args(["tool", "list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn test_local_install_list_info_uninstall() {
    let home = TempDir::new().unwrap();
    let source = TempDir::new().unwrap();
    write_local_tool(source.path());

    orla(home.path())
        .args(["tool", "install", "--local"])
        .arg(source.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully installed demo"))
        .stderr(predicate::str::contains("Installing demo 1.0.0"));

    assert!(home.path().join("tools/demo/1.0.0/bin/run").is_file());

    orla(home.path())
        .args(["tool", "list"])
        .assert()
        .success()
        .stdout("demo (1.0.0)\n");

    let output = orla(home.path())
        .args(["tool", "info", "demo", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["name"], "demo");
    assert_eq!(info["version"], "1.0.0");
    assert_eq!(info["entrypoint"], "bin/run");

    orla(home.path())
        .args(["tool", "uninstall", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully uninstalled tool 'demo'"));
    assert!(!home.path().join("tools/demo").exists());
}

#[test]
fn test_project_config_sets_tools_dir() {
    let home = TempDir::new().unwrap();
    let source = TempDir::new().unwrap();
    write_local_tool(source.path());
    fs::write(home.path().join("orla.yaml"), "tools_dir: ./project-tools\n").unwrap();

    orla(home.path())
        .args(["tool", "install", "--local"])
        .arg(source.path())
        .assert()
        .success();

    assert!(home.path().join("project-tools/demo/1.0.0/tool.yaml").is_file());
}

#[test]
fn test_local_install_rejects_name() {
    let home = TempDir::new().unwrap();
    orla(home.path())
        .args(["tool", "install", "demo", "--local", "."])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_uninstall_missing_tool_fails() {
    let home = TempDir::new().unwrap();
    orla(home.path())
        .args(["tool", "uninstall", "ghost"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Tool 'ghost' is not installed"));
}

#[test]
fn test_info_missing_tool_fails() {
    let home = TempDir::new().unwrap();
    orla(home.path())
        .args(["tool", "info", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not installed"));
}

#[test]
fn test_cache_clear() {
    let home = TempDir::new().unwrap();
    orla(home.path())
        .args(["cache", "clear"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cache directory not found"));

    fs::create_dir_all(home.path().join("cache/registry/abc")).unwrap();
    orla(home.path())
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout("Cache cleared successfully.\n");
    assert!(!home.path().join("cache/registry").exists());
}

#[test]
fn test_missing_explicit_config_is_usage_error() {
    let home = TempDir::new().unwrap();
    orla(home.path())
        .args(["--config", "missing.yaml", "tool", "list"])
        .assert()
        .failure()
        .code(2);
}
