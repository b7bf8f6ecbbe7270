mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use clap::builder::{PossibleValuesParser, TypedValueParser};
use tracing_subscriber::EnvFilter;

use llvm_archive_lib::consts::SUPPORTED_LLVM_VERSIONS;
use llvm_archive_lib::platform::paths;
use llvm_archive_lib::request::{BuildRequest, LlvmVersion};

/// Build an LLVM release branch from source and pack the install tree into a zip archive.
#[derive(Parser)]
#[command(name = "llvm-archive")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// LLVM major version to build
  #[arg(
    long,
    value_parser = PossibleValuesParser::new(SUPPORTED_LLVM_VERSIONS.iter().copied())
      .try_map(|s| s.parse::<LlvmVersion>())
  )]
  llvm_version: LlvmVersion,

  /// Discard existing stage outputs and redo every stage
  #[arg(short, long)]
  force: bool,

  /// Print the full error chain on failure and enable debug logging
  #[arg(short, long)]
  verbose: bool,

  /// Scratch directory for intermediate outputs [default: $LLVM_ARCHIVE_WORKSPACE or .temp]
  #[arg(long)]
  workspace: Option<PathBuf>,

  /// Directory the zip archive is written to [default: $LLVM_ARCHIVE_OUTPUT or archives]
  #[arg(long)]
  archives: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let request = BuildRequest {
    version: cli.llvm_version,
    workspace: cli.workspace.unwrap_or_else(paths::workspace_dir),
    archives_dir: cli.archives.unwrap_or_else(paths::archives_dir),
    force: cli.force,
    verbose: cli.verbose,
  };

  cmd::cmd_build(request)
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt().with_env_filter(filter).without_time().init();
}
