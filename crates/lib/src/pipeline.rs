//! Stage sequencing.
//!
//! A run verifies git, makes cmake available, then fetches, configures,
//! builds and packs. Stages run strictly in order and the first failure
//! aborts the run; completed stages are left in place for the next run.

use std::io;
use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;
use tracing::info;

use crate::archive::{self, ArchiveError};
use crate::build::{self, BuildError};
use crate::error::ErrorKind;
use crate::exec::SearchPath;
use crate::fetch::{self, FetchError, RepoSource};
use crate::layout::Layout;
use crate::platform::paths::ensure_dir;
use crate::platform::{Platform, PlatformError};
use crate::request::BuildRequest;
use crate::tools::{self, ToolError};

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Platform(#[from] PlatformError),

  #[error(transparent)]
  Tool(#[from] ToolError),

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error(transparent)]
  Archive(#[from] ArchiveError),

  #[error("failed to prepare directory '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl PipelineError {
  /// The category reported to the user in terse mode.
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Platform(_) => ErrorKind::UnsupportedPlatform,
      Self::Tool(e) => e.kind(),
      Self::Fetch(e) => e.kind(),
      Self::Build(e) => e.kind(),
      Self::Archive(e) => e.kind(),
      Self::Io { .. } => ErrorKind::IoFailure,
    }
  }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
  pub archive: PathBuf,
  pub install_dir: PathBuf,
}

/// One build of one LLVM version for the host platform.
#[derive(Debug)]
pub struct Pipeline {
  layout: Layout,
  search: SearchPath,
  force: bool,
}

impl Pipeline {
  /// Prepare a run on the detected host platform with the inherited `PATH`.
  pub fn new(request: BuildRequest) -> Result<Self, PipelineError> {
    let platform = Platform::detect()?;
    Self::with_environment(request, platform, SearchPath::from_env())
  }

  /// Prepare a run for an explicit platform and search path.
  ///
  /// Creates the workspace and archives directories and resolves them to
  /// absolute paths.
  pub fn with_environment(
    request: BuildRequest,
    platform: Platform,
    search: SearchPath,
  ) -> Result<Self, PipelineError> {
    let prepare = |path: &PathBuf| {
      ensure_dir(path).map_err(|source| PipelineError::Io {
        path: path.clone(),
        source,
      })
    };
    let workspace = prepare(&request.workspace)?;
    let archives_dir = prepare(&request.archives_dir)?;

    Ok(Self {
      layout: Layout::new(workspace, archives_dir, request.version, platform),
      search,
      force: request.force,
    })
  }

  pub fn layout(&self) -> &Layout {
    &self.layout
  }

  /// Run every stage in order.
  pub async fn run(mut self) -> Result<PipelineOutput, PipelineError> {
    let started = Instant::now();
    self.log_header();

    tools::ensure_git(&self.search)?;
    tools::ensure_cmake(&mut self.search, &self.layout, self.force).await?;

    let source = RepoSource::llvm(self.layout.version());
    fetch::fetch_repo(&self.search, &source, &self.layout.repo_dir(), self.force).await?;

    let install_dir = build::configure_and_build(&self.search, &self.layout, self.force).await?;
    let archive = archive::pack(&install_dir, &self.layout.archive_path(), self.force)?;

    info!(
      archive = %archive.display(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "build completed"
    );
    Ok(PipelineOutput { archive, install_dir })
  }

  fn log_header(&self) {
    let platform = self.layout.platform();
    info!(
      app_version = env!("CARGO_PKG_VERSION"),
      os = %platform.os,
      arch = %platform.arch,
      workspace = %self.layout.workspace().display(),
      archives = %self.layout.archives_dir().display(),
      force = self.force,
      llvm_version = %self.layout.version(),
      "initializing"
    );
  }
}
