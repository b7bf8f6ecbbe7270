use std::io;
use std::path::{Path, PathBuf};

use crate::consts::{ARCHIVES_ENV, WORKSPACE_ENV};

/// Returns the scratch directory holding every intermediate stage output.
///
/// `LLVM_ARCHIVE_WORKSPACE` overrides the default of `.temp` under the current directory.
pub fn workspace_dir() -> PathBuf {
  if let Ok(path) = std::env::var(WORKSPACE_ENV) {
    return PathBuf::from(path);
  }

  PathBuf::from(".temp")
}

/// Returns the directory the finished zip archives are written to.
///
/// `LLVM_ARCHIVE_OUTPUT` overrides the default of `archives` under the current directory.
pub fn archives_dir() -> PathBuf {
  if let Ok(path) = std::env::var(ARCHIVES_ENV) {
    return PathBuf::from(path);
  }

  PathBuf::from("archives")
}

/// Create `path` if missing and return its canonical absolute form.
///
/// Uses `dunce` so Windows paths stay in plain `C:\...` form, which cmake
/// and git accept.
pub fn ensure_dir(path: &Path) -> io::Result<PathBuf> {
  std::fs::create_dir_all(path)?;
  dunce::canonicalize(path)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn env_vars_override_defaults() {
    temp_env::with_vars(
      [
        (WORKSPACE_ENV, Some("/custom/workspace")),
        (ARCHIVES_ENV, Some("/custom/archives")),
      ],
      || {
        assert_eq!(workspace_dir(), PathBuf::from("/custom/workspace"));
        assert_eq!(archives_dir(), PathBuf::from("/custom/archives"));
      },
    );
  }

  #[test]
  #[serial]
  fn defaults_are_relative() {
    temp_env::with_vars([(WORKSPACE_ENV, None::<&str>), (ARCHIVES_ENV, None::<&str>)], || {
      assert_eq!(workspace_dir(), PathBuf::from(".temp"));
      assert_eq!(archives_dir(), PathBuf::from("archives"));
    });
  }

  #[test]
  fn ensure_dir_creates_and_canonicalizes() {
    let temp = tempfile::tempdir().unwrap();
    let nested = temp.path().join("a").join("..").join("b");

    let resolved = ensure_dir(&nested).unwrap();

    assert!(resolved.is_absolute());
    assert!(resolved.is_dir());
    assert_eq!(resolved, dunce::canonicalize(temp.path().join("b")).unwrap());
  }
}
