use std::time::{Duration, SystemTime};

use predicates::prelude::*;

use super::common::{BUILD_SCRIPT, FAILING_SCRIPT, TestEnv, set_mtime};

#[test]
fn first_build_creates_artifact() {
  let env = TestEnv::with_script(BUILD_SCRIPT);

  env
    .extbuild_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("Built ext.bin"));

  let content = std::fs::read_to_string(env.artifact()).unwrap();
  assert!(content.starts_with("cdef int add(int, int)\n"));
}

#[test]
fn scenario_build_then_nothing_to_do_then_clean() {
  let env = TestEnv::with_script(BUILD_SCRIPT);

  env.extbuild_cmd().arg("all").assert().success();
  assert!(env.artifact().exists());

  env
    .extbuild_cmd()
    .arg("all")
    .assert()
    .success()
    .stdout(predicate::str::contains("nothing to do"));

  env
    .extbuild_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed 1 artifact(s)"));
  assert!(!env.artifact().exists());
}

#[test]
fn touched_source_triggers_rebuild() {
  let env = TestEnv::with_script(BUILD_SCRIPT);
  env.extbuild_cmd().assert().success();

  env.touch_after_artifact("a.iface", 5);

  env
    .extbuild_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("Built ext.bin"));
}

#[test]
fn build_keeps_unrelated_matching_files() {
  let env = TestEnv::with_script(BUILD_SCRIPT);
  env.write_file("libdep.bin", "vendored");
  set_mtime(&env.path().join("libdep.bin"), SystemTime::now() - Duration::from_secs(3600));

  env
    .extbuild_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("Built ext.bin"));
  assert_eq!(std::fs::read_to_string(env.path().join("libdep.bin")).unwrap(), "vendored");

  env
    .extbuild_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("nothing to do"));
}

#[test]
fn failing_toolchain_reports_output_and_leaves_no_artifact() {
  let env = TestEnv::with_script(FAILING_SCRIPT);

  env
    .extbuild_cmd()
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("build failed"))
    .stderr(predicate::str::contains("b.impl:3: syntax error"));

  assert!(!env.artifact().exists());
  assert!(!env.path().join(".extbuild-building").exists());
}

#[test]
fn failing_toolchain_keeps_previous_artifact() {
  let env = TestEnv::with_script(BUILD_SCRIPT);
  env.extbuild_cmd().assert().success();
  let before = std::fs::read(env.artifact()).unwrap();

  env.write_config(FAILING_SCRIPT);
  env.touch_after_artifact("b.impl", 5);

  env.extbuild_cmd().assert().failure();

  assert_eq!(std::fs::read(env.artifact()).unwrap(), before);
}

#[test]
fn missing_source_fails() {
  let env = TestEnv::with_script(BUILD_SCRIPT);
  std::fs::remove_file(env.path().join("b.impl")).unwrap();

  env
    .extbuild_cmd()
    .assert()
    .failure()
    .stderr(predicate::str::contains("declared source does not exist: b.impl"));

  assert!(!env.artifact().exists());
}

#[test]
fn toolchain_without_artifact_fails() {
  let env = TestEnv::with_script("true");

  env
    .extbuild_cmd()
    .assert()
    .failure()
    .stderr(predicate::str::contains("produced no artifact matching `*.bin`"));
}

#[test]
fn dry_run_does_not_build() {
  let env = TestEnv::with_script(BUILD_SCRIPT);

  env
    .extbuild_cmd()
    .arg("--dry-run")
    .assert()
    .success()
    .stdout(predicate::str::contains("would rebuild"));

  assert!(!env.artifact().exists());
}

#[test]
fn verbose_echoes_toolchain_output() {
  let env = TestEnv::with_script(BUILD_SCRIPT);

  env
    .extbuild_cmd()
    .arg("--verbose")
    .assert()
    .success()
    .stderr(predicate::str::contains("compiling 2"));
}

#[test]
fn quiet_build_hides_toolchain_output() {
  let env = TestEnv::with_script(BUILD_SCRIPT);

  env
    .extbuild_cmd()
    .assert()
    .success()
    .stderr(predicate::str::contains("compiling").not());
}

#[test]
fn json_output_is_valid() {
  let env = TestEnv::with_script(BUILD_SCRIPT);

  let output = env.extbuild_cmd().args(["-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["target"], "all");
  assert_eq!(report["outcome"]["status"], "built");
  assert_eq!(report["outcome"]["artifacts"].as_array().unwrap().len(), 1);
}
