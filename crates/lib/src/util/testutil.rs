//! Test utilities for llvm-archive-lib.
//!
//! Cross-platform shell helpers plus fake executables that stand in for git,
//! cmake and llvm-config so the stages can be exercised without network access
//! or a real LLVM build.

use std::path::{Path, PathBuf};

use crate::exec::SearchPath;

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Write an executable `/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  std::fs::create_dir_all(dir).unwrap();
  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// The inherited search path with `bin` taking precedence, so fake tools
/// shadow real ones while still finding coreutils.
pub fn search_with(bin: &Path) -> SearchPath {
  let mut search = SearchPath::from_env();
  search.prepend(bin);
  search
}

/// Fake `git` that records its arguments in `git.log` next to itself and
/// creates the clone destination (its last argument).
#[cfg(unix)]
pub const FAKE_GIT: &str = r#"
echo "$@" >> "$(dirname "$0")/git.log"
for last; do :; done
mkdir -p "$last/llvm"
echo "cmake_minimum_required(VERSION 3.20)" > "$last/llvm/CMakeLists.txt"
"#;

/// Fake `git` that creates a partial clone and then fails.
#[cfg(unix)]
pub const FAILING_GIT: &str = r#"
echo "$@" >> "$(dirname "$0")/git.log"
for last; do :; done
mkdir -p "$last/.git"
echo "fatal: unable to access remote" >&2
exit 128
"#;

/// Fake `cmake` that records its arguments in `cmake.log` next to itself.
///
/// Configure (`-S ... -B <dir> -DCMAKE_INSTALL_PREFIX=<prefix>`) stores the
/// prefix in `<dir>/prefix`; build (`--build <dir>`) installs a working
/// `bin/llvm-config` under that prefix.
#[cfg(unix)]
pub const FAKE_CMAKE: &str = r#"
echo "$@" >> "$(dirname "$0")/cmake.log"
if [ "$1" = "--build" ]; then
  prefix=$(cat "$2/prefix")
  mkdir -p "$prefix/bin" "$prefix/lib"
  printf '#!/bin/sh\necho 19.1.7\n' > "$prefix/bin/llvm-config"
  chmod 755 "$prefix/bin/llvm-config"
  echo "archive" > "$prefix/lib/libLLVMCore.a"
  exit 0
fi
build_dir=""
prefix=""
while [ $# -gt 0 ]; do
  case "$1" in
    -B) build_dir="$2"; shift ;;
    -DCMAKE_INSTALL_PREFIX=*) prefix="${1#-DCMAKE_INSTALL_PREFIX=}" ;;
  esac
  shift
done
echo "$prefix" > "$build_dir/prefix"
"#;

/// Fake `cmake` whose configure step leaves junk behind and fails.
#[cfg(unix)]
pub const FAILING_CONFIGURE_CMAKE: &str = r#"
echo "$@" >> "$(dirname "$0")/cmake.log"
while [ $# -gt 0 ]; do
  if [ "$1" = "-B" ]; then echo "partial" > "$2/CMakeCache.txt"; fi
  shift
done
exit 1
"#;

/// Fake `cmake` that configures like `FAKE_CMAKE` but fails half-way through the build.
#[cfg(unix)]
pub const FAILING_BUILD_CMAKE: &str = r#"
echo "$@" >> "$(dirname "$0")/cmake.log"
if [ "$1" = "--build" ]; then
  prefix=$(cat "$2/prefix")
  mkdir -p "$prefix/lib"
  echo "truncated" > "$prefix/lib/libLLVMCore.a"
  exit 2
fi
build_dir=""
prefix=""
while [ $# -gt 0 ]; do
  case "$1" in
    -B) build_dir="$2"; shift ;;
    -DCMAKE_INSTALL_PREFIX=*) prefix="${1#-DCMAKE_INSTALL_PREFIX=}" ;;
  esac
  shift
done
echo "$prefix" > "$build_dir/prefix"
"#;

/// Fake `hdiutil` that records its arguments and `PAGER` in `hdiutil.log`.
///
/// `attach -quiet -mountpoint <mnt> <image>` creates `<mnt>` holding a
/// `CMake.app` bundle with `Contents/bin/cmake`; `detach -quiet <mnt>`
/// removes it again.
#[cfg(unix)]
pub const FAKE_HDIUTIL: &str = r#"
echo "$@ PAGER=$PAGER" >> "$(dirname "$0")/hdiutil.log"
case "$1" in
  attach)
    mkdir -p "$4/CMake.app/Contents/bin"
    printf '#!/bin/sh\necho cmake version 4.0.3\n' > "$4/CMake.app/Contents/bin/cmake"
    chmod 755 "$4/CMake.app/Contents/bin/cmake"
    ;;
  detach)
    rm -rf "$3"
    ;;
esac
"#;

/// Fake `hdiutil` whose attach succeeds without mounting anything.
#[cfg(unix)]
pub const NON_MOUNTING_HDIUTIL: &str = r#"
echo "$@ PAGER=$PAGER" >> "$(dirname "$0")/hdiutil.log"
"#;

/// Lines a fake tool appended to its log in `dir`.
pub fn log_lines(dir: &Path, log: &str) -> Vec<String> {
  std::fs::read_to_string(dir.join(log))
    .map(|content| content.lines().map(str::to_string).collect())
    .unwrap_or_default()
}

/// Write a gzipped tarball holding a fake `bin/cmake` under the directory `top`.
pub fn write_tar_gz(path: &Path, top: &str) {
  let file = std::fs::File::create(path).unwrap();
  let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
  let mut builder = tar::Builder::new(encoder);

  let content = b"#!/bin/sh\necho cmake version 4.1.0\n";
  let mut header = tar::Header::new_gnu();
  header.set_size(content.len() as u64);
  header.set_mode(0o755);
  header.set_cksum();
  builder
    .append_data(&mut header, format!("{}/bin/cmake", top), &content[..])
    .unwrap();
  builder.into_inner().unwrap().finish().unwrap();
}
