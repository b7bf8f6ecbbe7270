//! Pinned cmake releases and how to install them per platform.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::ToolError;
use super::download::{self, ArchiveFormat};
use crate::consts::{CMAKE_DIR_PREFIX, CMAKE_MACOS_MOUNT_POINT, CMAKE_RELEASES_URL};
use crate::exec::{self, SearchPath};
use crate::platform::Platform;
use crate::platform::arch::Arch;
use crate::platform::os::Os;

const WINDOWS_CMAKE_VERSION: &str = "4.1.0-rc3";
const LINUX_CMAKE_VERSION: &str = "4.1.0-rc4";
const MACOS_CMAKE_VERSION: &str = "4.0.3";

/// How a cmake release is obtained for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmakeInstaller {
  /// A zip or tar.gz release with a single `cmake-*` top-level directory.
  Archive { url: String, format: ArchiveFormat },
  /// A macOS disk image holding `CMake.app`.
  DiskImage { url: String, mount_point: PathBuf },
}

fn release_url(version: &str, file: &str) -> String {
  format!("{}/v{}/{}", CMAKE_RELEASES_URL, version, file)
}

impl CmakeInstaller {
  /// The pinned release for `platform`.
  pub fn for_platform(platform: Platform) -> Result<Self, ToolError> {
    let archive = |version: &str, suffix: &str, format: ArchiveFormat| Self::Archive {
      url: release_url(version, &format!("cmake-{}-{}.{}", version, suffix, format.extension())),
      format,
    };

    match (platform.os, platform.arch) {
      (Os::Windows, Arch::X86_64) => Ok(archive(WINDOWS_CMAKE_VERSION, "windows-x86_64", ArchiveFormat::Zip)),
      (Os::Windows, Arch::Arm64) => Ok(archive(WINDOWS_CMAKE_VERSION, "windows-arm64", ArchiveFormat::Zip)),
      (Os::Linux, Arch::X86_64) => Ok(archive(LINUX_CMAKE_VERSION, "linux-x86_64", ArchiveFormat::TarGz)),
      (Os::Linux, Arch::Arm64) => Ok(archive(LINUX_CMAKE_VERSION, "linux-aarch64", ArchiveFormat::TarGz)),
      (Os::MacOs, Arch::X86_64 | Arch::Arm64) => Ok(Self::DiskImage {
        url: release_url(
          MACOS_CMAKE_VERSION,
          &format!("cmake-{}-macos-universal.dmg", MACOS_CMAKE_VERSION),
        ),
        mount_point: PathBuf::from(CMAKE_MACOS_MOUNT_POINT),
      }),
      _ => Err(ToolError::NoCmakeRelease(platform)),
    }
  }

  pub fn url(&self) -> &str {
    match self {
      Self::Archive { url, .. } | Self::DiskImage { url, .. } => url,
    }
  }

  /// Install the release so that `dest/bin/cmake` exists.
  ///
  /// Downloads are staged in a temporary directory under `workspace`, which
  /// is removed whether or not the install succeeds. `dest` must not exist.
  pub async fn install(&self, search: &SearchPath, workspace: &Path, dest: &Path) -> Result<(), ToolError> {
    let staging = tempfile::Builder::new()
      .prefix(".cmake-download")
      .tempdir_in(workspace)
      .map_err(|e| ToolError::io(workspace, e))?;

    match self {
      Self::Archive { url, format } => install_archive(url, *format, staging.path(), dest).await,
      Self::DiskImage { url, mount_point } => install_disk_image(search, url, mount_point, staging.path(), dest).await,
    }
  }
}

async fn install_archive(url: &str, format: ArchiveFormat, staging: &Path, dest: &Path) -> Result<(), ToolError> {
  let archive = staging.join(format!("cmake.{}", format.extension()));
  download::download(url, &archive).await?;

  let extracted = staging.join("extracted");
  download::extract(&archive, format, &extracted)?;
  let top = download::single_dir_with_prefix(&extracted, CMAKE_DIR_PREFIX)?;

  fs::rename(&top, dest).map_err(|e| ToolError::io(dest, e))?;
  info!(from = %top.display(), to = %dest.display(), "moved extracted cmake");
  Ok(())
}

async fn install_disk_image(
  search: &SearchPath,
  url: &str,
  mount_point: &Path,
  staging: &Path,
  dest: &Path,
) -> Result<(), ToolError> {
  if search.find("hdiutil").is_none() {
    return Err(ToolError::MissingTool { tool: "hdiutil" });
  }
  if mount_point.exists() {
    return Err(ToolError::MountPointInUse(mount_point.to_path_buf()));
  }

  let image = staging.join("cmake.dmg");
  download::download(url, &image).await?;

  let mut attach = search.command("hdiutil")?;
  attach
    .args(["attach", "-quiet", "-mountpoint"])
    .arg(mount_point)
    .arg(&image)
    .env("PAGER", "cat");
  exec::run(&mut attach).await?;

  if !mount_point.exists() {
    return Err(ToolError::MountFailed(mount_point.to_path_buf()));
  }

  let copied = copy_app_contents(search, mount_point, dest).await;
  let detached = detach(search, mount_point).await;
  copied?;
  detached
}

async fn copy_app_contents(search: &SearchPath, mount_point: &Path, dest: &Path) -> Result<(), ToolError> {
  let contents = mount_point.join("CMake.app").join("Contents");
  info!(from = %contents.display(), to = %dest.display(), "copying cmake from disk image");

  let mut copy = search.command("cp")?;
  copy.arg("-R").arg(&contents).arg(dest);
  exec::run(&mut copy).await?;
  Ok(())
}

async fn detach(search: &SearchPath, mount_point: &Path) -> Result<(), ToolError> {
  let mut command = search.command("hdiutil")?;
  command.args(["detach", "-quiet"]).arg(mount_point);
  if let Err(e) = exec::run(&mut command).await {
    warn!(mount_point = %mount_point.display(), error = %e, "failed to detach cmake disk image");
    return Err(e.into());
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use tempfile::TempDir;

  #[test]
  fn windows_uses_zip_release() {
    let installer = CmakeInstaller::for_platform(Platform::new(Os::Windows, Arch::X86_64)).unwrap();
    assert_eq!(
      installer,
      CmakeInstaller::Archive {
        url: "https://github.com/Kitware/CMake/releases/download/v4.1.0-rc3/cmake-4.1.0-rc3-windows-x86_64.zip"
          .to_string(),
        format: ArchiveFormat::Zip,
      }
    );

    let arm = CmakeInstaller::for_platform(Platform::new(Os::Windows, Arch::Arm64)).unwrap();
    assert!(arm.url().ends_with("cmake-4.1.0-rc3-windows-arm64.zip"));
  }

  #[test]
  fn linux_uses_tarball_with_aarch64_name() {
    let x64 = CmakeInstaller::for_platform(Platform::new(Os::Linux, Arch::X86_64)).unwrap();
    assert_eq!(
      x64.url(),
      "https://github.com/Kitware/CMake/releases/download/v4.1.0-rc4/cmake-4.1.0-rc4-linux-x86_64.tar.gz"
    );

    let arm = CmakeInstaller::for_platform(Platform::new(Os::Linux, Arch::Arm64)).unwrap();
    assert!(matches!(arm, CmakeInstaller::Archive { format: ArchiveFormat::TarGz, .. }));
    assert!(arm.url().ends_with("cmake-4.1.0-rc4-linux-aarch64.tar.gz"));
  }

  #[test]
  fn macos_uses_universal_disk_image() {
    for arch in [Arch::X86_64, Arch::Arm64] {
      let installer = CmakeInstaller::for_platform(Platform::new(Os::MacOs, arch)).unwrap();
      assert_eq!(
        installer,
        CmakeInstaller::DiskImage {
          url: "https://github.com/Kitware/CMake/releases/download/v4.0.3/cmake-4.0.3-macos-universal.dmg".to_string(),
          mount_point: PathBuf::from("/Volumes/cmake-macos"),
        }
      );
    }
  }

  #[test]
  fn x86_has_no_release() {
    for os in [Os::Windows, Os::Linux, Os::MacOs] {
      let err = CmakeInstaller::for_platform(Platform::new(os, Arch::X86)).unwrap_err();
      assert_eq!(err.kind(), ErrorKind::UnsupportedPlatform);
    }
  }

  #[tokio::test]
  async fn disk_image_requires_hdiutil() {
    let temp = TempDir::new().unwrap();
    let installer = CmakeInstaller::DiskImage {
      url: "http://127.0.0.1:9/cmake.dmg".to_string(),
      mount_point: temp.path().join("mnt"),
    };

    let err = installer
      .install(&SearchPath::default(), temp.path(), &temp.path().join("cmake"))
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingTool);
  }

  #[tokio::test]
  #[serial_test::serial]
  #[cfg(unix)]
  async fn disk_image_refuses_busy_mount_point() {
    let temp = TempDir::new().unwrap();
    let bin = temp.path().join("bin");
    crate::util::testutil::write_script(&bin, "hdiutil", "exit 0");
    let mount_point = temp.path().join("mnt");
    fs::create_dir(&mount_point).unwrap();

    let installer = CmakeInstaller::DiskImage {
      url: "http://127.0.0.1:9/cmake.dmg".to_string(),
      mount_point: mount_point.clone(),
    };
    let err = installer
      .install(&SearchPath::from_dirs([&bin]), temp.path(), &temp.path().join("cmake"))
      .await
      .unwrap_err();

    assert!(matches!(err, ToolError::MountPointInUse(ref path) if path == &mount_point));
    assert!(!temp.path().join("cmake").exists());
  }

  #[cfg(unix)]
  mod disk_image {
    use super::*;
    use crate::util::testutil::{FAKE_HDIUTIL, NON_MOUNTING_HDIUTIL, log_lines, search_with, write_script};
    use serial_test::serial;

    struct Fixture {
      temp: TempDir,
      bin: PathBuf,
      mount_point: PathBuf,
      _server: mockito::ServerGuard,
      installer: CmakeInstaller,
    }

    impl Fixture {
      async fn new(hdiutil: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        write_script(&bin, "hdiutil", hdiutil);
        let mount_point = temp.path().join("mnt");

        let mut server = mockito::Server::new_async().await;
        server
          .mock("GET", "/cmake.dmg")
          .with_status(200)
          .with_body(b"dmg")
          .create_async()
          .await;
        let installer = CmakeInstaller::DiskImage {
          url: format!("{}/cmake.dmg", server.url()),
          mount_point: mount_point.clone(),
        };
        Self {
          temp,
          bin,
          mount_point,
          _server: server,
          installer,
        }
      }

      fn dest(&self) -> PathBuf {
        self.temp.path().join("cmake")
      }

      async fn install(&self) -> Result<(), ToolError> {
        self.installer.install(&search_with(&self.bin), self.temp.path(), &self.dest()).await
      }

      fn hdiutil_calls(&self) -> Vec<String> {
        log_lines(&self.bin, "hdiutil.log")
      }
    }

    #[tokio::test]
    #[serial]
    async fn copies_app_contents_and_detaches() {
      let f = Fixture::new(FAKE_HDIUTIL).await;
      f.install().await.unwrap();

      assert!(f.dest().join("bin").join("cmake").is_file());
      assert!(!f.mount_point.exists());

      let calls = f.hdiutil_calls();
      assert_eq!(calls.len(), 2);
      assert!(calls[0].starts_with(&format!("attach -quiet -mountpoint {} ", f.mount_point.display())));
      assert!(calls[0].ends_with(".dmg PAGER=cat"));
      assert!(calls[1].starts_with(&format!("detach -quiet {}", f.mount_point.display())));

      let leftovers: Vec<_> = fs::read_dir(f.temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with(".cmake-download"))
        .collect();
      assert!(leftovers.is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn failed_copy_still_detaches() {
      let f = Fixture::new(FAKE_HDIUTIL).await;
      write_script(&f.bin, "cp", "exit 1");

      let err = f.install().await.unwrap_err();

      assert!(matches!(err, ToolError::Exec(_)));
      assert_eq!(err.kind(), ErrorKind::ExternalProcessFailure);
      let calls = f.hdiutil_calls();
      assert_eq!(calls.len(), 2);
      assert!(calls[0].starts_with("attach -quiet -mountpoint"));
      assert!(calls[1].starts_with("detach -quiet"));
      assert!(!f.mount_point.exists());
      assert!(!f.dest().exists());
    }

    #[tokio::test]
    #[serial]
    async fn attach_without_mount_point_fails() {
      let f = Fixture::new(NON_MOUNTING_HDIUTIL).await;

      let err = f.install().await.unwrap_err();

      assert!(matches!(err, ToolError::MountFailed(ref path) if path == &f.mount_point));
      assert_eq!(err.kind(), ErrorKind::ExternalProcessFailure);
      assert_eq!(f.hdiutil_calls().len(), 1);
      assert!(!f.dest().exists());
    }
  }
}
