mod common;

use assert_cmd::cargo::CommandCargoExt;
use serial_test::serial;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn build(root: &Path, dir: &Path, extra: &[&str]) -> Output {
    let config = common::config_for_this_host(dir, "sh");
    let python = common::python_dir(dir);
    let bin = common::fake_tools(dir);
    Command::cargo_bin("gdbforge-build")
        .unwrap()
        .env("PATH", common::path_with(&bin))
        .env_remove("DEV")
        .arg("--root")
        .arg(root)
        .arg("--config")
        .arg(config)
        .arg("--with-python-dir")
        .arg(python)
        .args(extra)
        .output()
        .unwrap()
}

#[test]
#[serial]
fn test_full_build() {
    let dir = tempfile::tempdir().unwrap();
    let root = common::project(dir.path());

    let output = build(&root, dir.path(), &[]);
    assert!(output.status.success(), "{output:?}");
    assert!(root.join("ext/build.complete").is_file());
    assert!(root.join("ext/dst").is_dir());

    let patch_log = fs::read_to_string(root.join("ext/log/patch.log")).unwrap();
    let leak = patch_log.find("patching with leak").unwrap();
    let strings = patch_log.find("patching with strings").unwrap();
    assert!(leak < strings);

    let install_log = fs::read_to_string(root.join("ext/log/install.log")).unwrap();
    assert!(install_log.contains("make install"));
    let configure_log = fs::read_to_string(root.join("ext/log/configure.log")).unwrap();
    assert!(configure_log.contains("--with-python="));
}

#[test]
#[serial]
fn test_patch_failure_reported() {
    let dir = tempfile::tempdir().unwrap();
    let root = common::project(dir.path());
    fs::write(root.join("patches/gdb-strings.patch"), "FAIL").unwrap();

    let output = build(&root, dir.path(), &["--quiet"]);
    assert_eq!(output.status.code(), Some(1));
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("patch gdb-strings (2/2)"), "{err}");
    assert!(err.contains("test@example.invalid"), "{err}");
    assert!(err.contains("patch.log"), "{err}");
    assert!(!root.join("ext/build.complete").exists());
    assert!(root.join("ext/src/gdb-7.2/gdb").is_dir());
}

#[test]
#[serial]
fn test_missing_archive() {
    let dir = tempfile::tempdir().unwrap();
    let root = common::project(dir.path());
    fs::remove_file(root.join("ext/src/gdb-7.2.tar.bz2")).unwrap();

    let output = build(&root, dir.path(), &["--quiet"]);
    assert_eq!(output.status.code(), Some(1));
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("gdb-7.2.tar.bz2"), "{err}");
}

#[test]
#[serial]
fn test_dev_mode_from_env() {
    if which::which("git").is_err() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let root = common::project(dir.path());
    let config = common::config_for_this_host(dir.path(), "sh");
    let python = common::python_dir(dir.path());
    let bin = common::fake_tools(dir.path());

    let output = Command::cargo_bin("gdbforge-build")
        .unwrap()
        .env("PATH", common::path_with(&bin))
        .env("DEV", "1")
        .arg("--root")
        .arg(&root)
        .arg("--config")
        .arg(config)
        .arg("--with-python-dir")
        .arg(python)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    assert!(root.join("ext/src/gdb-7.2/gdb/.git").is_dir());
    assert!(root.join("ext/log/checkpoint.log").is_file());
}

#[test]
#[serial]
fn test_relative_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = common::project(dir.path());
    let config = common::config_for_this_host(dir.path(), "sh");
    common::python_dir(dir.path());
    let bin = common::fake_tools(dir.path());

    let output = Command::cargo_bin("gdbforge-build")
        .unwrap()
        .current_dir(dir.path())
        .env("PATH", common::path_with(&bin))
        .env_remove("DEV")
        .arg("--root")
        .arg("project")
        .arg("--config")
        .arg(config)
        .arg("--with-python-dir")
        .arg("python")
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    assert!(root.join("ext/src/gdb-7.2/gdb").is_dir());
    assert!(root.join("ext/build.complete").is_file());

    let configure_log = fs::read_to_string(root.join("ext/log/configure.log")).unwrap();
    let prefix = root.canonicalize().unwrap().join("ext/dst");
    assert!(
        configure_log.contains(&format!("--prefix={}/", prefix.display())),
        "{configure_log}"
    );
    let python = dir.path().canonicalize().unwrap().join("python");
    assert!(
        configure_log.contains(&format!("--with-python={}", python.display())),
        "{configure_log}"
    );
}
