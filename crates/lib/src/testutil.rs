//! Test helpers shared across modules.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use tempfile::TempDir;

use crate::source::SourceSet;
use crate::toolchain::{BuildError, Toolchain, ToolchainOutput};

/// What [`FakeToolchain`] does when invoked.
#[derive(Debug, Clone, Copy)]
pub enum Step {
  /// Write an artifact with this file name and succeed.
  Produce(&'static str),
  /// Write a partial artifact with this file name, then fail.
  FailAfterWriting(&'static str),
  /// Succeed without writing anything.
  ProduceNothing,
}

/// In-process toolchain that counts invocations and records which files were
/// in the working directory when it ran.
pub struct FakeToolchain {
  step: Cell<Step>,
  calls: Cell<usize>,
  seen: RefCell<Vec<String>>,
}

impl FakeToolchain {
  pub fn new(step: Step) -> Self {
    FakeToolchain {
      step: Cell::new(step),
      calls: Cell::new(0),
      seen: RefCell::new(Vec::new()),
    }
  }

  pub fn set_step(&self, step: Step) {
    self.step.set(step);
  }

  pub fn calls(&self) -> usize {
    self.calls.get()
  }

  pub fn saw_artifact(&self, name: &str) -> bool {
    self.seen.borrow().iter().any(|seen| seen == name)
  }
}

impl Toolchain for FakeToolchain {
  async fn compile(&self, sources: &SourceSet) -> Result<ToolchainOutput, BuildError> {
    let call = self.calls.get() + 1;
    self.calls.set(call);
    for entry in std::fs::read_dir(sources.root())? {
      self.seen.borrow_mut().push(entry?.file_name().to_string_lossy().into_owned());
    }

    match self.step.get() {
      Step::Produce(name) => {
        let mut content = format!("build #{call}\n");
        for path in sources.resolved() {
          content.push_str(&std::fs::read_to_string(path)?);
        }
        std::fs::write(sources.root().join(name), content)?;
        Ok(ToolchainOutput::default())
      }
      Step::FailAfterWriting(name) => {
        std::fs::write(sources.root().join(name), "partial")?;
        Err(BuildError::Failed {
          program: "fake".to_string(),
          code: Some(1),
          output: "fake: compilation failed".to_string(),
        })
      }
      Step::ProduceNothing => Ok(ToolchainOutput::default()),
    }
  }
}

/// A temp working directory holding `a.iface` and `b.impl`.
pub fn source_dir() -> (TempDir, SourceSet) {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("a.iface"), "interface\n").unwrap();
  std::fs::write(temp.path().join("b.impl"), "implementation\n").unwrap();
  let sources = SourceSet::new(temp.path(), vec![PathBuf::from("a.iface"), PathBuf::from("b.impl")]).unwrap();
  (temp, sources)
}
