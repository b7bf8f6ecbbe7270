//! Stage path derivation.
//!
//! Every stage owns one path under the workspace (or the archives directory
//! for the final zip). Each name is a pure function of the LLVM version, the
//! platform tag and the stage, so reruns for the same (version, platform) find
//! the same state and different pairs never collide:
//!
//! ```text
//! <workspace>/cmake/                               local cmake bootstrap
//! <workspace>/llvm-project-<version>/              cloned source tree
//! <workspace>/llvm-cmake-<version>-<os>-<arch>/    generated build configuration
//! <workspace>/llvm-<version>-<os>-<arch>/          installed build output
//! <archives>/llvm-<version>-<os>-<arch>.zip        packaged deliverable
//! ```

use std::path::{Path, PathBuf};

use crate::consts::TOOLCHAIN_NAME;
use crate::platform::Platform;
use crate::request::LlvmVersion;

pub fn repo_dir_name(version: LlvmVersion) -> String {
  format!("{}-project-{}", TOOLCHAIN_NAME, version)
}

pub fn config_dir_name(version: LlvmVersion, platform: Platform) -> String {
  format!("{}-cmake-{}-{}", TOOLCHAIN_NAME, version, platform.tag())
}

pub fn install_dir_name(version: LlvmVersion, platform: Platform) -> String {
  format!("{}-{}-{}", TOOLCHAIN_NAME, version, platform.tag())
}

pub fn archive_file_name(version: LlvmVersion, platform: Platform) -> String {
  format!("{}.zip", install_dir_name(version, platform))
}

/// Resolved stage paths for one (version, platform) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
  workspace: PathBuf,
  archives_dir: PathBuf,
  version: LlvmVersion,
  platform: Platform,
}

impl Layout {
  pub fn new(
    workspace: impl Into<PathBuf>,
    archives_dir: impl Into<PathBuf>,
    version: LlvmVersion,
    platform: Platform,
  ) -> Self {
    Self {
      workspace: workspace.into(),
      archives_dir: archives_dir.into(),
      version,
      platform,
    }
  }

  pub fn workspace(&self) -> &Path {
    &self.workspace
  }

  pub fn archives_dir(&self) -> &Path {
    &self.archives_dir
  }

  pub fn version(&self) -> LlvmVersion {
    self.version
  }

  pub fn platform(&self) -> Platform {
    self.platform
  }

  pub fn cmake_dir(&self) -> PathBuf {
    self.workspace.join("cmake")
  }

  pub fn cmake_bin_dir(&self) -> PathBuf {
    self.cmake_dir().join("bin")
  }

  pub fn repo_dir(&self) -> PathBuf {
    self.workspace.join(repo_dir_name(self.version))
  }

  /// The cmake source root inside the cloned monorepo.
  pub fn llvm_source_dir(&self) -> PathBuf {
    self.repo_dir().join("llvm")
  }

  pub fn config_dir(&self) -> PathBuf {
    self.workspace.join(config_dir_name(self.version, self.platform))
  }

  pub fn install_dir(&self) -> PathBuf {
    self.workspace.join(install_dir_name(self.version, self.platform))
  }

  pub fn install_bin_dir(&self) -> PathBuf {
    self.install_dir().join("bin")
  }

  pub fn archive_path(&self) -> PathBuf {
    self.archives_dir.join(archive_file_name(self.version, self.platform))
  }
}
