use predicates::prelude::*;

use super::common::{BUILD_SCRIPT, TestEnv};

const NO_TOOLCHAIN_CONFIG: &str = r#"sources = ["a.iface", "b.impl"]
artifact = "*.bin"

[toolchain]
program = "/nonexistent/python"
args = ["-c", 'cat "$@" > ext.bin', "extbuild"]
append_sources = true
"#;

#[test]
fn python_flag_overrides_config() {
  let env = TestEnv::new();
  env.write_file("extbuild.toml", NO_TOOLCHAIN_CONFIG);

  env.extbuild_cmd().args(["--python", "/bin/sh"]).assert().success();

  assert!(env.artifact().exists());
}

#[test]
fn python_env_overrides_config() {
  let env = TestEnv::new();
  env.write_file("extbuild.toml", NO_TOOLCHAIN_CONFIG);

  env.extbuild_cmd().env("EXTBUILD_PYTHON", "/bin/sh").assert().success();

  assert!(env.artifact().exists());
}

#[test]
fn unspawnable_toolchain_fails() {
  let env = TestEnv::new();
  env.write_file("extbuild.toml", NO_TOOLCHAIN_CONFIG);

  env
    .extbuild_cmd()
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to spawn toolchain `/nonexistent/python`"));
}

#[test]
fn source_flags_replace_configured_sources() {
  let env = TestEnv::with_script(BUILD_SCRIPT);

  env.extbuild_cmd().args(["-s", "b.impl"]).assert().success();

  let content = std::fs::read_to_string(env.artifact()).unwrap();
  assert!(content.starts_with("cdef int add(int a, int b)"));
}

#[test]
fn explicit_config_file_is_used() {
  let env = TestEnv::new();
  let config = format!(
    "sources = [\"a.iface\"]\nartifact = \"*.bin\"\n\n[toolchain]\nprogram = \"/bin/sh\"\nargs = [\"-c\", '{}', \"extbuild\"]\nappend_sources = true\n",
    BUILD_SCRIPT
  );
  env.write_file("conf/release.toml", &config);

  env
    .extbuild_cmd()
    .arg("--config")
    .arg(env.path().join("conf/release.toml"))
    .assert()
    .success();

  assert!(env.artifact().exists());
}

#[test]
fn invalid_artifact_pattern_fails_all() {
  let env = TestEnv::new();
  env.write_file("extbuild.toml", "sources = [\"a.iface\"]\nartifact = \"[*.bin\"\n");

  env
    .extbuild_cmd()
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid artifact pattern"));
}

#[test]
fn relative_config_is_found_in_working_directory() {
  let env = TestEnv::new();
  let config = format!(
    "sources = [\"b.impl\"]\nartifact = \"*.bin\"\n\n[toolchain]\nprogram = \"/bin/sh\"\nargs = [\"-c\", '{}', \"extbuild\"]\nappend_sources = true\n",
    BUILD_SCRIPT
  );
  env.write_file("conf/release.toml", &config);

  env
    .extbuild_cmd()
    .current_dir(std::env::temp_dir())
    .args(["--config", "conf/release.toml"])
    .assert()
    .success();

  let content = std::fs::read_to_string(env.artifact()).unwrap();
  assert!(content.starts_with("cdef int add(int a, int b)"));
}
