use std::fmt;

use super::PlatformError;

/// CPU architectures an LLVM archive can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  X86,
  X86_64,
  Arm64,
}

impl Arch {
  /// Detect the CPU architecture this binary is running on
  pub fn current() -> Result<Self, PlatformError> {
    Self::from_machine(std::env::consts::ARCH)
  }

  /// Map a machine string (as `uname -m` or a target triple spells it) to an `Arch`
  pub fn from_machine(machine: &str) -> Result<Self, PlatformError> {
    match machine.to_ascii_lowercase().as_str() {
      "amd64" | "x86_64" | "x64" => Ok(Self::X86_64),
      "i386" | "i686" | "x86" => Ok(Self::X86),
      "arm64" | "aarch64" | "aarch64_be" => Ok(Self::Arm64),
      _ => Err(PlatformError::UnsupportedArch(machine.to_string())),
    }
  }

  /// Returns the lowercase string identifier used in stage and archive names
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86 => "x86",
      Self::X86_64 => "x86_64",
      Self::Arm64 => "arm64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
