//! extbuild-lib: incremental build orchestration for a single extension module.
//!
//! The crate decides whether an in-place extension build is needed and runs it:
//! - `SourceSet`: the declared, ordered inputs of the build
//! - `StalenessChecker`: compares input timestamps with the last output
//! - `BuildInvoker`: runs the external `Toolchain` with rollback on failure
//! - `CleanupHandler`: removes produced artifacts
//! - `Orchestrator`: resolves a `Target` and sequences the above

pub mod artifact;
pub mod cleanup;
pub mod config;
pub mod consts;
pub mod invoker;
pub mod marker;
pub mod orchestrator;
pub mod source;
pub mod staleness;
pub mod toolchain;

#[cfg(test)]
pub(crate) mod testutil;

pub use artifact::ArtifactPattern;
pub use cleanup::CleanupHandler;
pub use config::{BuildConfig, ConfigError, ToolchainConfig};
pub use invoker::BuildInvoker;
pub use marker::BuildMarker;
pub use orchestrator::{Orchestrator, Outcome, RunError, RunReport, State, Target};
pub use source::SourceSet;
pub use staleness::{FsTimestamps, OutputStamp, StalenessChecker, StalenessError, Timestamps};
pub use toolchain::{BuildError, CommandToolchain, Toolchain, ToolchainOutput};
