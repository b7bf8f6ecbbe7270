//! Stage state handling.
//!
//! A stage's output path doubles as its completion marker. `check` decides
//! whether a stage has to run, clearing stale state first when forced, and
//! `StageGuard` removes a stage's path again if the stage fails before it is
//! committed, so a broken half-finished directory is never mistaken for a
//! finished one on the next run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum StageError {
  #[error("failed to remove '{path}': {source}")]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to create '{path}': {source}")]
  Create {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// What a stage found at its output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
  /// Output exists and force is off: nothing to do.
  Done,
  /// Output existed but force is on: it has been removed.
  Cleared,
  /// No output yet.
  Missing,
}

impl StageStatus {
  pub fn needs_run(self) -> bool {
    !matches!(self, StageStatus::Done)
  }
}

/// Inspect a stage path, removing it when `force` is set.
pub fn check(path: &Path, force: bool) -> Result<StageStatus, StageError> {
  if fs::symlink_metadata(path).is_err() {
    return Ok(StageStatus::Missing);
  }
  if !force {
    return Ok(StageStatus::Done);
  }

  remove_path(path).map_err(|source| StageError::Remove {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(StageStatus::Cleared)
}

/// Remove a file or directory tree.
///
/// When the plain removal is denied, owner write permission is restored
/// across the tree and the removal is retried once. Git marks its object
/// files read-only, which blocks deletion on Windows; on Unix a read-only
/// directory blocks deletion of its entries.
pub fn remove_path(path: &Path) -> io::Result<()> {
  let metadata = match fs::symlink_metadata(path) {
    Ok(metadata) => metadata,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
    Err(e) => return Err(e),
  };

  let remove = |path: &Path| {
    if metadata.is_dir() {
      fs::remove_dir_all(path)
    } else {
      fs::remove_file(path)
    }
  };

  match remove(path) {
    Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
      debug!(path = %path.display(), "clearing read-only attributes before removal");
      make_writable(path);
      remove(path)
    }
    other => other,
  }
}

fn make_writable(path: &Path) {
  for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
    if let Ok(metadata) = entry.metadata() {
      let mut permissions = metadata.permissions();
      if grant_owner_write(&mut permissions, metadata.is_dir()) {
        let _ = fs::set_permissions(entry.path(), permissions);
      }
    }
  }
}

/// Adds owner write (and search, for directories); returns whether anything changed.
#[cfg(unix)]
fn grant_owner_write(permissions: &mut fs::Permissions, is_dir: bool) -> bool {
  use std::os::unix::fs::PermissionsExt;

  let mode = permissions.mode();
  let wanted = if is_dir { mode | 0o700 } else { mode | 0o200 };
  if wanted == mode {
    return false;
  }
  permissions.set_mode(wanted);
  true
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn grant_owner_write(permissions: &mut fs::Permissions, _is_dir: bool) -> bool {
  if !permissions.readonly() {
    return false;
  }
  permissions.set_readonly(false);
  true
}

/// Scoped ownership of a stage's output path.
///
/// Until `commit` is called, dropping the guard deletes the path. Stages create
/// the guard before invoking the external tool, and commit once it succeeds.
#[derive(Debug)]
pub struct StageGuard {
  path: PathBuf,
  armed: bool,
}

impl StageGuard {
  /// Claim `path` without creating it (for tools that create it themselves).
  pub fn claim(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      armed: true,
    }
  }

  /// Create `path` as a directory and claim it.
  pub fn create_dir(path: impl Into<PathBuf>) -> Result<Self, StageError> {
    let guard = Self::claim(path);
    fs::create_dir_all(&guard.path).map_err(|source| StageError::Create {
      path: guard.path.clone(),
      source,
    })?;
    Ok(guard)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Keep the stage output and return its path.
  pub fn commit(mut self) -> PathBuf {
    self.armed = false;
    std::mem::take(&mut self.path)
  }
}

impl Drop for StageGuard {
  fn drop(&mut self) {
    if !self.armed {
      return;
    }
    if let Err(e) = remove_path(&self.path) {
      warn!(path = %self.path.display(), error = %e, "failed to clean up incomplete stage output");
    } else {
      debug!(path = %self.path.display(), "removed incomplete stage output");
    }
  }
}
