use std::path::PathBuf;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use extbuild_lib::Target;

mod cmd;
mod output;

use cmd::{Settings, cmd_all, cmd_clean, cmd_refresh};
use output::{OutputFormat, print_error};

/// extbuild - incremental in-place build of a native extension module
#[derive(Parser)]
#[command(name = "extbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Target to resolve: all, clean or refresh
  #[arg(default_value = "all")]
  target: String,

  /// Working directory holding the sources and artifacts
  #[arg(short = 'C', long, default_value = ".")]
  directory: PathBuf,

  /// Build configuration file, relative to the working directory (default: extbuild.toml)
  #[arg(long)]
  config: Option<PathBuf>,

  /// Toolchain program (overrides EXTBUILD_PYTHON and the config file)
  #[arg(long)]
  python: Option<String>,

  /// Source file, repeatable (replaces the configured sources)
  #[arg(short, long = "source")]
  sources: Vec<PathBuf>,

  /// Echo toolchain output and enable debug logging
  #[arg(short, long)]
  verbose: bool,

  /// Only report whether `all` would rebuild (rejected for other targets)
  #[arg(long)]
  dry_run: bool,

  /// Output format
  #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,
}

fn main() {
  let cli = Cli::parse();
  reject_misplaced_flags(&cli);

  init_tracing(cli.verbose);

  if let Err(err) = run(cli) {
    print_error(&format!("{:#}", err));
    std::process::exit(1);
  }
}

fn reject_misplaced_flags(cli: &Cli) {
  let target = cli.target.parse::<Target>();
  if cli.dry_run && target.is_ok_and(|target| target != Target::All) {
    Cli::command()
      .error(
        ErrorKind::ArgumentConflict,
        format!("--dry-run only applies to `all`, not `{}`", cli.target),
      )
      .exit();
  }
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "extbuild=debug,extbuild_lib=debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<()> {
  let target: Target = cli.target.parse()?;

  let settings = Settings {
    directory: cli.directory,
    config: cli.config,
    python: cli.python,
    sources: cli.sources,
    verbose: cli.verbose,
    output: cli.output,
  };

  match target {
    Target::All => cmd_all(&settings, cli.dry_run),
    Target::Clean => cmd_clean(&settings),
    Target::Refresh => cmd_refresh(&settings),
  }
}
