//! External tool verification.
//!
//! git is a hard prerequisite. cmake is taken from the search path when
//! available, otherwise from a local install under the workspace, which is
//! bootstrapped from a pinned upstream release on first use.

pub mod download;
pub mod installer;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::error::ErrorKind;
use crate::exec::{ExecError, SearchPath};
use crate::layout::Layout;
use crate::platform::Platform;
use crate::stage::{self, StageError, StageGuard, StageStatus};

pub use installer::CmakeInstaller;

#[derive(Debug, Error)]
pub enum ToolError {
  #[error("{tool} not found. Please install {tool}.")]
  MissingTool { tool: &'static str },

  #[error("no cmake release is available for {0}; install cmake manually")]
  NoCmakeRelease(Platform),

  #[error("failed to download {url}: {message}")]
  Download { url: String, message: String },

  #[error("failed to extract '{path}': {message}")]
  Extract { path: PathBuf, message: String },

  #[error("expected 1 directory starting with '{prefix}' after extraction, got {}: {found:?}", .found.len())]
  AmbiguousExtraction { prefix: String, found: Vec<String> },

  #[error("mount point '{0}' already exists; detach it first")]
  MountPointInUse(PathBuf),

  #[error("failed to mount cmake disk image at '{0}'")]
  MountFailed(PathBuf),

  #[error(transparent)]
  Exec(#[from] ExecError),

  #[error(transparent)]
  Stage(#[from] StageError),

  #[error("io error at '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl ToolError {
  pub(crate) fn io(path: &Path, source: io::Error) -> Self {
    Self::Io {
      path: path.to_path_buf(),
      source,
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::MissingTool { .. } => ErrorKind::MissingTool,
      Self::NoCmakeRelease(_) => ErrorKind::UnsupportedPlatform,
      Self::Download { .. } => ErrorKind::DownloadFailure,
      Self::Extract { .. } => ErrorKind::ArchiveFailure,
      Self::AmbiguousExtraction { .. } => ErrorKind::AmbiguousExtraction,
      Self::MountPointInUse(_) => ErrorKind::MountPointInUse,
      Self::MountFailed(_) | Self::Exec(_) => ErrorKind::ExternalProcessFailure,
      Self::Stage(_) | Self::Io { .. } => ErrorKind::IoFailure,
    }
  }
}

/// Where the cmake used by the build comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmakeSource {
  /// Already on the search path.
  System(PathBuf),
  /// A previous bootstrap under the workspace (its `bin` directory).
  Local(PathBuf),
  /// Installed by this run (its `bin` directory).
  Bootstrapped(PathBuf),
}

/// Fail unless `git` can be found on the search path.
pub fn ensure_git(search: &SearchPath) -> Result<PathBuf, ToolError> {
  info!("verifying git");
  let path = search.find("git").ok_or(ToolError::MissingTool { tool: "git" })?;
  info!(path = %path.display(), "git found");
  Ok(path)
}

/// Make `cmake` available on the search path, bootstrapping a local copy if needed.
pub async fn ensure_cmake(search: &mut SearchPath, layout: &Layout, force: bool) -> Result<CmakeSource, ToolError> {
  ensure_cmake_with(search, layout, force, || CmakeInstaller::for_platform(layout.platform())).await
}

/// `ensure_cmake` with the installer resolved by `resolve_installer`, called
/// only when a bootstrap is actually needed.
pub(crate) async fn ensure_cmake_with<F>(
  search: &mut SearchPath,
  layout: &Layout,
  force: bool,
  resolve_installer: F,
) -> Result<CmakeSource, ToolError>
where
  F: FnOnce() -> Result<CmakeInstaller, ToolError>,
{
  info!("verifying cmake");
  if let Some(path) = search.find("cmake") {
    info!(path = %path.display(), "cmake found");
    return Ok(CmakeSource::System(path));
  }

  warn!("no global cmake, checking locally");
  let cmake_dir = layout.cmake_dir();
  let bin_dir = layout.cmake_bin_dir();

  match stage::check(&cmake_dir, force)? {
    StageStatus::Done => {
      info!(path = %cmake_dir.display(), "found local cmake, adding to search path (use --force to reinstall)");
      search.prepend(&bin_dir);
      return Ok(CmakeSource::Local(bin_dir));
    }
    StageStatus::Cleared => warn!(path = %cmake_dir.display(), "local cmake removed (--force), reinstalling"),
    StageStatus::Missing => info!(path = %cmake_dir.display(), "no local cmake found, installing"),
  }

  let installer = resolve_installer()?;
  let guard = StageGuard::claim(&cmake_dir);
  installer.install(search, layout.workspace(), guard.path()).await?;
  guard.commit();

  search.prepend(&bin_dir);
  info!(path = %bin_dir.display(), "cmake installed successfully");
  Ok(CmakeSource::Bootstrapped(bin_dir))
}
