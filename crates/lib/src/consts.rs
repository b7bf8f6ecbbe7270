
/// Name prefix shared by every LLVM stage path and the final archive.
pub const TOOLCHAIN_NAME: &str = "llvm";

/// LLVM major versions accepted on the command line.
pub const SUPPORTED_LLVM_VERSIONS: &[&str] = &["19", "20", "21"];

pub const MIN_LLVM_VERSION: u16 = 10;
pub const MAX_LLVM_VERSION: u16 = 10000;

pub const LLVM_REPO_URL: &str = "https://github.com/llvm/llvm-project.git";

pub const CMAKE_RELEASES_URL: &str = "https://github.com/Kitware/CMake/releases/download";

/// Directory name prefix of a freshly extracted cmake release.
pub const CMAKE_DIR_PREFIX: &str = "cmake-";

pub const CMAKE_MACOS_MOUNT_POINT: &str = "/Volumes/cmake-macos";

/// Executables probed, in order, to validate an LLVM install.
pub const LLVM_CONFIG_CANDIDATES: &[&str] = &["llvm-config", "llvm-config.exe", "llvm_config", "llvm_config.exe"];

pub const WORKSPACE_ENV: &str = "LLVM_ARCHIVE_WORKSPACE";
pub const ARCHIVES_ENV: &str = "LLVM_ARCHIVE_OUTPUT";
