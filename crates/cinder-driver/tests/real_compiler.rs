//! Builds the fixture projects with the C++ compiler found on this machine.
//!
//! Every test returns early when no compiler is installed.

use cinder_build::{BuildConfig, CompilerConfig};
use cinder_deps::TargetSelection;
use cinder_driver::{find_compiler, Driver};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Copy a fixture into a fresh directory and return a driver for it.
fn project(name: &str) -> Option<(TempDir, Driver)> {
    let compiler = match find_compiler() {
        Ok(path) => path,
        Err(_) => return None, // Skip if no compiler
    };
    let dir = TempDir::new().expect("Failed to create temp dir");
    for entry in std::fs::read_dir(fixture(name)).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    let config = BuildConfig {
        compiler: CompilerConfig {
            cxx: Some(compiler),
            ..CompilerConfig::default()
        },
        ..BuildConfig::default()
    };
    let driver = Driver::new(dir.path(), config).unwrap();
    Some((dir, driver))
}

#[test]
fn test_single_main_with_arguments() {
    let Some((dir, driver)) = project("single_main_with_arguments") else {
        return;
    };
    let toolchain = driver.toolchain().unwrap();
    let plan = driver.plan(&TargetSelection::Discover).unwrap();
    let report = driver.build(&plan, &toolchain).unwrap();
    assert_eq!(report.linked, vec!["main"]);

    let exe = dir.path().join("main");
    let output = Command::new(&exe).arg("world").output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello world");

    let output = Command::new(&exe).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "not enough arguments"
    );

    let plan = driver.plan(&TargetSelection::Discover).unwrap();
    assert!(plan.stale_steps().is_empty());
}

#[test]
fn test_main_with_helper_unit() {
    let Some((dir, driver)) = project("main_with_helper") else {
        return;
    };
    let toolchain = driver.toolchain().unwrap();
    let plan = driver.plan(&TargetSelection::Discover).unwrap();
    assert_eq!(
        plan.targets()[0].objects,
        vec![PathBuf::from("main.o"), PathBuf::from("greeting.o")]
    );

    let report = driver.build(&plan, &toolchain).unwrap();
    assert_eq!(report.compiled.len(), 2);

    let output = Command::new(dir.path().join("main")).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello cinder");

    let commands = driver.compile_commands(&plan, &toolchain).unwrap();
    let entry = commands
        .commands()
        .iter()
        .find(|c| c.file == Path::new("greeting.cpp"))
        .unwrap();
    assert!(entry.arguments.as_ref().unwrap().contains(&"-c".to_string()));
}
