use predicates::prelude::*;

use super::common::{BUILD_SCRIPT, TestEnv};

#[test]
fn clean_twice_never_fails() {
  let env = TestEnv::with_script(BUILD_SCRIPT);
  env.extbuild_cmd().assert().success();

  env
    .extbuild_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed 1 artifact(s)"));

  env
    .extbuild_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed 0 artifact(s)"));
}

#[test]
fn clean_keeps_sources_marker_and_config() {
  let env = TestEnv::with_script(BUILD_SCRIPT);
  env.extbuild_cmd().assert().success();
  env.extbuild_cmd().arg("refresh").assert().success();

  env.extbuild_cmd().arg("clean").assert().success();

  assert!(env.path().join("a.iface").exists());
  assert!(env.path().join("b.impl").exists());
  assert!(env.path().join(".refresh").exists());
  assert!(env.path().join("extbuild.toml").exists());
}

#[test]
fn clean_with_broken_config_uses_defaults() {
  let env = TestEnv::new();
  env.write_file("extbuild.toml", "sources = [");
  env.write_file("ext.so", "binary");
  env.write_file("ext.bin", "binary");

  env
    .extbuild_cmd()
    .arg("clean")
    .assert()
    .success()
    .stderr(predicate::str::contains("Ignoring build configuration"));

  assert!(!env.path().join("ext.so").exists());
  assert!(env.path().join("ext.bin").exists());
}

#[test]
fn clean_json_output() {
  let env = TestEnv::with_script(BUILD_SCRIPT);
  env.extbuild_cmd().assert().success();

  env
    .extbuild_cmd()
    .args(["clean", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"status\": \"cleaned\""))
    .stdout(predicate::str::contains("\"removed\": 1"));
}
