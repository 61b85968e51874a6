//! Fixed names and defaults shared by the library and the CLI.

pub const APP_NAME: &str = "extbuild";

/// Default build configuration file, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "extbuild.toml";

/// Sentinel file whose timestamp forces the next `all` to rebuild.
pub const MARKER_FILENAME: &str = ".refresh";

/// Journal written while the toolchain runs. Its presence at startup means
/// the previous build was interrupted.
pub const JOURNAL_FILENAME: &str = ".extbuild-building";

/// Directory holding the previous artifacts for the duration of a build.
pub const BACKUP_DIRNAME: &str = ".extbuild-prev";

/// Environment variable overriding the toolchain program.
pub const PYTHON_ENV_VAR: &str = "EXTBUILD_PYTHON";

#[cfg(not(windows))]
pub const DEFAULT_ARTIFACT_PATTERN: &str = "*.so";

#[cfg(windows)]
pub const DEFAULT_ARTIFACT_PATTERN: &str = "*.pyd";

#[cfg(not(windows))]
pub const DEFAULT_PYTHON: &str = "python3";

#[cfg(windows)]
pub const DEFAULT_PYTHON: &str = "python";

/// `setup.py` finds its own sources, so none are appended by default. `--force`
/// because the staleness decision has already been made.
pub const DEFAULT_TOOLCHAIN_ARGS: &[&str] = &["setup.py", "build_ext", "--inplace", "--force"];
