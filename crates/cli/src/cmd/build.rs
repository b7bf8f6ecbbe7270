//! Implementation of the `llvm-archive` build command.
//!
//! Runs the whole pipeline on a single-threaded runtime and translates the
//! outcome into an exit code.

use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{error, info};

use llvm_archive_lib::pipeline::{Pipeline, PipelineError, PipelineOutput};
use llvm_archive_lib::request::BuildRequest;

use crate::output::{format_bytes, format_duration, print_failure, print_stat, print_success};

/// Execute the build.
///
/// On failure in terse mode only `[<kind>]: <message>` is printed and the exit
/// code is 1. In verbose mode the error is returned so the full cause chain is
/// reported by `main`.
pub fn cmd_build(request: BuildRequest) -> Result<ExitCode> {
  let started = Instant::now();
  let verbose = request.verbose;

  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")?;

  match rt.block_on(run(request)) {
    Ok(output) => {
      info!(path = %output.archive.display(), "archive saved");
      print_success("Build completed!");
      print_stat("Archive", &output.archive.display().to_string());
      if let Ok(metadata) = std::fs::metadata(&output.archive) {
        print_stat("Size", &format_bytes(metadata.len()));
      }
      print_stat("Elapsed", &format_duration(started.elapsed()));
      Ok(ExitCode::SUCCESS)
    }
    Err(err) if verbose => {
      let kind = err.kind();
      error!(kind = %kind, "build failed");
      Err(anyhow::Error::new(err).context(format!("build failed [{}]", kind)))
    }
    Err(err) => {
      error!(kind = %err.kind(), "build failed");
      print_failure(err.kind().as_str(), &err.to_string());
      Ok(ExitCode::FAILURE)
    }
  }
}

async fn run(request: BuildRequest) -> Result<PipelineOutput, PipelineError> {
  Pipeline::new(request)?.run().await
}
