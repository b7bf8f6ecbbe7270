//! Source acquisition: a shallow clone of one LLVM release branch.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::consts::LLVM_REPO_URL;
use crate::error::ErrorKind;
use crate::exec::{self, ExecError, SearchPath};
use crate::request::LlvmVersion;
use crate::stage::{self, StageError, StageGuard, StageStatus};

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("failed to clone {url} ({branch}): {source}")]
  Clone {
    url: String,
    branch: String,
    #[source]
    source: ExecError,
  },

  #[error(transparent)]
  Stage(#[from] StageError),
}

impl FetchError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Clone { .. } => ErrorKind::ExternalProcessFailure,
      Self::Stage(_) => ErrorKind::IoFailure,
    }
  }
}

/// A git remote and the single branch to clone from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSource {
  pub url: String,
  pub branch: String,
}

impl RepoSource {
  /// The upstream monorepo at the release branch for `version`.
  pub fn llvm(version: LlvmVersion) -> Self {
    Self {
      url: LLVM_REPO_URL.to_string(),
      branch: version.release_branch(),
    }
  }
}

/// Clone `source` into `repo_path` unless a previous run already did.
///
/// With `force`, an existing checkout is deleted and cloned again. A clone
/// that fails part-way is removed so the next run starts clean.
pub async fn fetch_repo(
  search: &SearchPath,
  source: &RepoSource,
  repo_path: &Path,
  force: bool,
) -> Result<PathBuf, FetchError> {
  match stage::check(repo_path, force)? {
    StageStatus::Done => {
      info!(path = %repo_path.display(), "repository already present, skipping clone (use --force to clone again)");
      return Ok(repo_path.to_path_buf());
    }
    StageStatus::Cleared => warn!(path = %repo_path.display(), "removed existing repository (--force)"),
    StageStatus::Missing => {}
  }

  info!(url = %source.url, branch = %source.branch, path = %repo_path.display(), "cloning repository");
  let guard = StageGuard::claim(repo_path);

  let clone_error = |source_err: ExecError| FetchError::Clone {
    url: source.url.clone(),
    branch: source.branch.clone(),
    source: source_err,
  };

  let mut command = search.command("git").map_err(clone_error)?;
  command
    .args(["clone", "-b", source.branch.as_str(), "--depth", "1", source.url.as_str()])
    .arg(guard.path());
  exec::run(&mut command).await.map_err(clone_error)?;

  info!(path = %repo_path.display(), "clone complete");
  Ok(guard.commit())
}
