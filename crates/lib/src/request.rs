//! Build request types.
//!
//! A `BuildRequest` is assembled once from CLI input and never mutated.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::consts::{MAX_LLVM_VERSION, MIN_LLVM_VERSION};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
  #[error("invalid LLVM version '{0}': expected a major version number")]
  NotANumber(String),

  #[error("LLVM version {0} is out of range ({MIN_LLVM_VERSION}..={MAX_LLVM_VERSION})")]
  OutOfRange(u32),
}

/// An LLVM major version, bounded to `10..=10000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LlvmVersion(u16);

impl LlvmVersion {
  pub fn new(major: u32) -> Result<Self, VersionError> {
    if !(u32::from(MIN_LLVM_VERSION)..=u32::from(MAX_LLVM_VERSION)).contains(&major) {
      return Err(VersionError::OutOfRange(major));
    }
    Ok(Self(major as u16))
  }

  pub fn major(&self) -> u16 {
    self.0
  }

  /// The upstream release branch for this version (e.g., `release/19.x`).
  pub fn release_branch(&self) -> String {
    format!("release/{}.x", self.0)
  }
}

impl FromStr for LlvmVersion {
  type Err = VersionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let major = s
      .trim()
      .parse::<u32>()
      .map_err(|_| VersionError::NotANumber(s.to_string()))?;
    Self::new(major)
  }
}

impl fmt::Display for LlvmVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Everything a single pipeline run needs from the user.
#[derive(Debug, Clone)]
pub struct BuildRequest {
  pub version: LlvmVersion,
  /// Scratch root for all intermediate stage outputs.
  pub workspace: PathBuf,
  /// Directory the final zip archive is written to.
  pub archives_dir: PathBuf,
  /// Discard existing stage state and redo every stage.
  pub force: bool,
  /// Surface the full error chain instead of a one-line summary.
  pub verbose: bool,
}
