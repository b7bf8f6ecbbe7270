//! Packaging the install tree into the distributable zip.
//!
//! The archive holds a single top-level directory named after the install
//! directory, so extracting it anywhere recreates `llvm-<version>-<os>-<arch>/`.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

use crate::error::ErrorKind;
use crate::stage::{self, StageError, StageGuard, StageStatus};

/// Entries at or above this size need zip64 headers.
const LARGE_FILE_THRESHOLD: u64 = 0xFFFF_FFFF;

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("failed to write zip entry '{entry}': {source}")]
  Zip {
    entry: String,
    #[source]
    source: ZipError,
  },

  #[error("failed to walk '{path}': {source}")]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("io error at '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("'{0}' has no directory name to root the archive at")]
  NoRootName(PathBuf),

  #[error(transparent)]
  Stage(#[from] StageError),
}

impl ArchiveError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Zip { .. } | Self::Walk { .. } | Self::NoRootName(_) => ErrorKind::ArchiveFailure,
      Self::Io { .. } | Self::Stage(_) => ErrorKind::IoFailure,
    }
  }
}

/// Zip `install_dir` to `archive_path`, skipping when the archive exists and
/// `force` is unset. Returns the archive path.
pub fn pack(install_dir: &Path, archive_path: &Path, force: bool) -> Result<PathBuf, ArchiveError> {
  match stage::check(archive_path, force)? {
    StageStatus::Done => {
      info!(path = %archive_path.display(), "archive already packed, skipping (use --force to repack)");
      return Ok(archive_path.to_path_buf());
    }
    StageStatus::Cleared => warn!(path = %archive_path.display(), "removed existing archive (--force), repacking"),
    StageStatus::Missing => info!(path = %archive_path.display(), "packing LLVM install"),
  }

  if let Some(parent) = archive_path.parent() {
    fs::create_dir_all(parent).map_err(|source| ArchiveError::Io {
      path: parent.to_path_buf(),
      source,
    })?;
  }

  let guard = StageGuard::claim(archive_path);
  let file = File::create(guard.path()).map_err(|source| ArchiveError::Io {
    path: archive_path.to_path_buf(),
    source,
  })?;

  let count = write_tree(install_dir, BufWriter::new(file))?;

  info!(path = %archive_path.display(), entries = count, "archive packed");
  Ok(guard.commit())
}

fn write_tree<W: io::Write + io::Seek>(root: &Path, writer: W) -> Result<usize, ArchiveError> {
  let root_name = root
    .file_name()
    .map(|name| name.to_string_lossy().to_string())
    .ok_or_else(|| ArchiveError::NoRootName(root.to_path_buf()))?;

  let mut zip = ZipWriter::new(writer);
  let mut count = 0;

  for entry in WalkDir::new(root).follow_links(true) {
    let entry = entry.map_err(|source| ArchiveError::Walk {
      path: root.to_path_buf(),
      source,
    })?;
    let path = entry.path();
    let name = entry_name(&root_name, root, path);
    let metadata = entry.metadata().map_err(|source| ArchiveError::Walk {
      path: path.to_path_buf(),
      source,
    })?;
    let options = with_permissions(
      SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
      &metadata,
    );

    debug!(entry = %name, "adding to archive");
    if metadata.is_dir() {
      zip
        .add_directory(format!("{}/", name), options)
        .map_err(|source| ArchiveError::Zip { entry: name, source })?;
    } else {
      let options = options.large_file(metadata.len() >= LARGE_FILE_THRESHOLD);
      zip
        .start_file(name.as_str(), options)
        .map_err(|source| ArchiveError::Zip {
          entry: name.clone(),
          source,
        })?;
      let mut input = File::open(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
      })?;
      io::copy(&mut input, &mut zip).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
      })?;
    }
    count += 1;
  }

  let mut writer = zip.finish().map_err(|source| ArchiveError::Zip {
    entry: root_name,
    source,
  })?;
  writer.flush().map_err(|source| ArchiveError::Io {
    path: root.to_path_buf(),
    source,
  })?;
  Ok(count)
}

/// Archive name for `path`: `root_name` followed by the path below `root`,
/// always with `/` separators.
fn entry_name(root_name: &str, root: &Path, path: &Path) -> String {
  let relative = path.strip_prefix(root).unwrap_or(path);
  std::iter::once(root_name.to_string())
    .chain(relative.components().map(|c| c.as_os_str().to_string_lossy().to_string()))
    .collect::<Vec<_>>()
    .join("/")
}

#[cfg(unix)]
fn with_permissions(options: SimpleFileOptions, metadata: &fs::Metadata) -> SimpleFileOptions {
  use std::os::unix::fs::PermissionsExt;
  options.unix_permissions(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn with_permissions(options: SimpleFileOptions, _metadata: &fs::Metadata) -> SimpleFileOptions {
  options
}
