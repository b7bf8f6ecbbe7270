//! Release download and extraction.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::ToolError;

/// Container format of a downloaded release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
  Zip,
  TarGz,
}

impl ArchiveFormat {
  /// File extension used when saving a download of this format.
  pub fn extension(&self) -> &'static str {
    match self {
      Self::Zip => "zip",
      Self::TarGz => "tar.gz",
    }
  }
}

/// Download `url` to `dest`, streaming the body to disk.
pub async fn download(url: &str, dest: &Path) -> Result<(), ToolError> {
  info!(url = %url, "downloading");

  let mut response = reqwest::get(url).await.map_err(|e| ToolError::Download {
    url: url.to_string(),
    message: e.to_string(),
  })?;

  if !response.status().is_success() {
    return Err(ToolError::Download {
      url: url.to_string(),
      message: format!("HTTP {}", response.status()),
    });
  }

  let mut file = tokio::fs::File::create(dest).await.map_err(|e| ToolError::io(dest, e))?;
  let mut size = 0usize;

  while let Some(chunk) = response.chunk().await.map_err(|e| ToolError::Download {
    url: url.to_string(),
    message: e.to_string(),
  })? {
    size += chunk.len();
    file.write_all(&chunk).await.map_err(|e| ToolError::io(dest, e))?;
  }
  file.flush().await.map_err(|e| ToolError::io(dest, e))?;

  info!(path = %dest.display(), size, "download complete");
  Ok(())
}

/// Unpack `archive_path` into `dest`, keeping the archive's own top-level layout.
pub fn extract(archive_path: &Path, format: ArchiveFormat, dest: &Path) -> Result<(), ToolError> {
  fs::create_dir_all(dest).map_err(|e| ToolError::io(dest, e))?;

  match format {
    ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest),
    ArchiveFormat::Zip => extract_zip(archive_path, dest),
  }?;

  debug!(archive = %archive_path.display(), dest = %dest.display(), "extracted");
  Ok(())
}

fn extract_tar_gz(archive_path: &Path, dest: &Path) -> Result<(), ToolError> {
  let file = File::open(archive_path).map_err(|e| ToolError::io(archive_path, e))?;
  let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
  archive.unpack(dest).map_err(|e| ToolError::Extract {
    path: archive_path.to_path_buf(),
    message: e.to_string(),
  })
}

fn extract_zip(archive_path: &Path, dest: &Path) -> Result<(), ToolError> {
  let file = File::open(archive_path).map_err(|e| ToolError::io(archive_path, e))?;
  let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| ToolError::Extract {
    path: archive_path.to_path_buf(),
    message: e.to_string(),
  })?;
  archive.extract(dest).map_err(|e| ToolError::Extract {
    path: archive_path.to_path_buf(),
    message: e.to_string(),
  })
}

/// Find the single directory directly under `dir` whose name starts with `prefix`.
///
/// Zero or several candidates is an error: the extracted layout is not what
/// the installer expects, and picking one would be a guess.
pub fn single_dir_with_prefix(dir: &Path, prefix: &str) -> Result<PathBuf, ToolError> {
  let mut found = Vec::new();

  for entry in fs::read_dir(dir).map_err(|e| ToolError::io(dir, e))? {
    let entry = entry.map_err(|e| ToolError::io(dir, e))?;
    let name = entry.file_name().to_string_lossy().to_string();
    if name.starts_with(prefix) && entry.path().is_dir() {
      found.push(name);
    }
  }

  if found.len() != 1 {
    found.sort();
    return Err(ToolError::AmbiguousExtraction {
      prefix: prefix.to_string(),
      found,
    });
  }

  Ok(dir.join(&found[0]))
}
