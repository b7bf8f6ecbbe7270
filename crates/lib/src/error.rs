//! Error categories shared by every stage.

use std::fmt;

/// The category an error is reported under when the pipeline aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The host OS or architecture is not one the pipeline can build for.
  UnsupportedPlatform,
  /// A required executable is not installed.
  MissingTool,
  /// An extracted release did not contain exactly one expected directory.
  AmbiguousExtraction,
  /// An external process could not start or exited unsuccessfully.
  ExternalProcessFailure,
  /// The install tree has no llvm-config to validate with.
  MissingVersionQuery,
  /// The disk image mount point is already taken.
  MountPointInUse,
  DownloadFailure,
  ArchiveFailure,
  IoFailure,
}

impl ErrorKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::UnsupportedPlatform => "UnsupportedPlatform",
      Self::MissingTool => "MissingTool",
      Self::AmbiguousExtraction => "AmbiguousExtraction",
      Self::ExternalProcessFailure => "ExternalProcessFailure",
      Self::MissingVersionQuery => "MissingVersionQuery",
      Self::MountPointInUse => "MountPointInUse",
      Self::DownloadFailure => "DownloadFailure",
      Self::ArchiveFailure => "ArchiveFailure",
      Self::IoFailure => "IoFailure",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
