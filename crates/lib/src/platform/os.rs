use std::fmt;

use super::PlatformError;

/// Operating system families an LLVM archive can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Windows,
  Linux,
  MacOs,
}

impl Os {
  /// Detect the operating system this binary is running on
  pub fn current() -> Result<Self, PlatformError> {
    Self::from_reported(std::env::consts::OS)
  }

  /// Map an OS string as reported by the host to an `Os`.
  ///
  /// Accepts both Rust target names (`macos`) and the names other tooling
  /// reports for the same systems (`darwin`, `win32`).
  pub fn from_reported(name: &str) -> Result<Self, PlatformError> {
    match name.to_ascii_lowercase().as_str() {
      "windows" | "win32" => Ok(Self::Windows),
      "linux" => Ok(Self::Linux),
      "macos" | "darwin" => Ok(Self::MacOs),
      _ => Err(PlatformError::UnsupportedOs(name.to_string())),
    }
  }

  /// Returns the lowercase string identifier used in stage and archive names
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Windows => "windows",
      Self::Linux => "linux",
      Self::MacOs => "macos",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
