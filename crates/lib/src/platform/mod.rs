pub mod arch;
pub mod os;
pub mod paths;

use std::fmt;

use thiserror::Error;

use arch::Arch;
use os::Os;

/// Errors raised while identifying the host platform.
#[derive(Debug, Error)]
pub enum PlatformError {
  #[error("Unsupported platform: {0}")]
  UnsupportedOs(String),

  #[error("Unsupported architecture: {0}")]
  UnsupportedArch(String),
}

/// Platform tag combining OS and architecture (e.g., "linux-x86_64")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub os: Os,
  pub arch: Arch,
}

impl Platform {
  /// Create a new platform tag
  pub fn new(os: Os, arch: Arch) -> Self {
    Self { os, arch }
  }

  /// Detect the current platform.
  ///
  /// Meant to run once at startup; the result is passed to every stage.
  pub fn detect() -> Result<Self, PlatformError> {
    Ok(Self {
      os: Os::current()?,
      arch: Arch::current()?,
    })
  }

  /// Returns the tag used as the suffix of stage and archive names (e.g., "macos-arm64")
  pub fn tag(&self) -> String {
    format!("{}-{}", self.os, self.arch)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.tag())
  }
}
