//! LLVM configure, build and validation stages.
//!
//! Configuration lands in the per-platform config directory and the install
//! tree in the per-platform install directory (see `layout`). Each stage is
//! skipped when its directory already exists and removed again if its tool
//! fails.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::consts::LLVM_CONFIG_CANDIDATES;
use crate::error::ErrorKind;
use crate::exec::{self, ExecError, SearchPath};
use crate::layout::Layout;
use crate::stage::{self, StageError, StageGuard, StageStatus};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("failed to configure LLVM: {0}")]
  Configure(#[source] ExecError),

  #[error("failed to build LLVM: {0}")]
  Build(#[source] ExecError),

  #[error("llvm-config not found in '{dir}'")]
  VersionQueryNotFound { dir: PathBuf },

  #[error("'{path} --version' failed: {source}")]
  Validate {
    path: PathBuf,
    #[source]
    source: ExecError,
  },

  #[error(transparent)]
  Stage(#[from] StageError),
}

impl BuildError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Configure(_) | Self::Build(_) | Self::Validate { .. } => ErrorKind::ExternalProcessFailure,
      Self::VersionQueryNotFound { .. } => ErrorKind::MissingVersionQuery,
      Self::Stage(_) => ErrorKind::IoFailure,
    }
  }
}

/// Configure, build and validate; returns the install directory.
pub async fn configure_and_build(search: &SearchPath, layout: &Layout, force: bool) -> Result<PathBuf, BuildError> {
  configure(search, layout, force).await?;
  let install_dir = build(search, layout, force).await?;
  let version = validate(search, &install_dir).await?;
  info!(version = %version, path = %install_dir.display(), "LLVM install validated");
  Ok(install_dir)
}

/// Generate the build configuration for the cloned source tree.
pub async fn configure(search: &SearchPath, layout: &Layout, force: bool) -> Result<PathBuf, BuildError> {
  let config_dir = layout.config_dir();
  match stage::check(&config_dir, force)? {
    StageStatus::Done => {
      info!(path = %config_dir.display(), "LLVM already configured, skipping (use --force to reconfigure)");
      return Ok(config_dir);
    }
    StageStatus::Cleared => warn!(path = %config_dir.display(), "removed existing configuration (--force)"),
    StageStatus::Missing => info!(path = %config_dir.display(), "configuring LLVM"),
  }

  let guard = StageGuard::create_dir(&config_dir)?;

  let mut command = search.command("cmake").map_err(BuildError::Configure)?;
  command
    .arg("-S")
    .arg(layout.llvm_source_dir())
    .arg("-B")
    .arg(guard.path())
    .arg(exec::define("CMAKE_INSTALL_PREFIX", layout.install_dir()))
    .arg("-DLLVM_TARGETS_TO_BUILD=host")
    .arg("-DCMAKE_BUILD_TYPE=Release");
  exec::run(&mut command).await.map_err(BuildError::Configure)?;

  info!(path = %config_dir.display(), "LLVM configured");
  Ok(guard.commit())
}

/// Build and install from an existing configuration.
pub async fn build(search: &SearchPath, layout: &Layout, force: bool) -> Result<PathBuf, BuildError> {
  let install_dir = layout.install_dir();
  match stage::check(&install_dir, force)? {
    StageStatus::Done => {
      info!(path = %install_dir.display(), "LLVM already built, skipping (use --force to rebuild)");
      return Ok(install_dir);
    }
    StageStatus::Cleared => warn!(path = %install_dir.display(), "removed existing install (--force), rebuilding"),
    StageStatus::Missing => info!(path = %install_dir.display(), "building LLVM"),
  }

  let guard = StageGuard::create_dir(&install_dir)?;

  let mut command = search.command("cmake").map_err(BuildError::Build)?;
  command
    .arg("--build")
    .arg(layout.config_dir())
    .args(["--target", "install", "--config", "Release"]);
  exec::run(&mut command).await.map_err(BuildError::Build)?;

  info!(path = %install_dir.display(), "LLVM built");
  Ok(guard.commit())
}

/// First `llvm-config` variant present in `install_dir/bin`.
pub fn find_version_query(install_dir: &Path) -> Option<PathBuf> {
  let bin = install_dir.join("bin");
  LLVM_CONFIG_CANDIDATES
    .iter()
    .map(|name| bin.join(name))
    .find(|path| path.is_file())
}

/// Run the installed `llvm-config --version`; returns the reported version.
pub async fn validate(search: &SearchPath, install_dir: &Path) -> Result<String, BuildError> {
  let config = find_version_query(install_dir).ok_or_else(|| BuildError::VersionQueryNotFound {
    dir: install_dir.to_path_buf(),
  })?;

  let failed = |source| BuildError::Validate {
    path: config.clone(),
    source,
  };
  let mut command = search.command_at(&config).map_err(failed)?;
  command.arg("--version");
  exec::run_captured(&mut command).await.map_err(failed)
}
