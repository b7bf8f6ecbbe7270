//! External process execution.
//!
//! Every tool the pipeline drives (git, cmake, hdiutil, llvm-config) is spawned
//! through a `SearchPath`. The search path is an explicit value owned by the
//! pipeline: bootstrapping cmake prepends a directory to it, and every later
//! spawn resolves programs and sets `PATH` from it. The process environment
//! itself is never modified.

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ExecError {
  /// The program could not be started at all.
  #[error("failed to run '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  Failed { cmd: String, code: Option<i32> },

  /// A search path entry cannot be encoded into `PATH`.
  #[error("invalid search path: {0}")]
  InvalidSearchPath(#[from] env::JoinPathsError),
}

/// Ordered list of directories used to find executables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
  dirs: Vec<PathBuf>,
}

impl SearchPath {
  /// Snapshot of the `PATH` this process was started with.
  pub fn from_env() -> Self {
    let dirs = env::var_os("PATH")
      .map(|path| env::split_paths(&path).collect())
      .unwrap_or_default();
    Self { dirs }
  }

  pub fn from_dirs<I, P>(dirs: I) -> Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    Self {
      dirs: dirs.into_iter().map(Into::into).collect(),
    }
  }

  pub fn dirs(&self) -> &[PathBuf] {
    &self.dirs
  }

  /// Give `dir` precedence over every existing entry.
  pub fn prepend(&mut self, dir: impl Into<PathBuf>) {
    let dir = dir.into();
    debug!(dir = %dir.display(), "prepending to search path");
    self.dirs.retain(|existing| existing != &dir);
    self.dirs.insert(0, dir);
  }

  /// The search path encoded as a `PATH` value.
  pub fn to_os_string(&self) -> Result<OsString, ExecError> {
    Ok(env::join_paths(&self.dirs)?)
  }

  /// Locate `program` on this search path.
  pub fn find(&self, program: &str) -> Option<PathBuf> {
    let path = self.to_os_string().ok()?;
    let cwd = env::current_dir().unwrap_or_default();
    which::which_in(program, Some(path), cwd).ok()
  }

  /// Build a command for `program`, resolved against and inheriting this search path.
  pub fn command(&self, program: &str) -> Result<Command, ExecError> {
    let resolved = self.find(program).unwrap_or_else(|| PathBuf::from(program));
    self.command_at(&resolved)
  }

  /// Build a command for an executable at a known location, inheriting this search path.
  pub fn command_at(&self, program: &Path) -> Result<Command, ExecError> {
    let mut command = Command::new(program);
    command.env("PATH", self.to_os_string()?);
    Ok(command)
  }
}

/// Run a command with inherited stdio, failing on a non-zero exit.
///
/// Used for long-running tools whose progress the user should see.
pub async fn run(command: &mut Command) -> Result<(), ExecError> {
  let cmd = describe(command);
  info!(cmd = %cmd, "running");

  let status = command.status().await.map_err(|source| ExecError::Spawn {
    program: program_name(command),
    source,
  })?;

  if !status.success() {
    return Err(ExecError::Failed {
      cmd,
      code: status.code(),
    });
  }

  Ok(())
}

/// Run a command capturing its output; returns trimmed stdout on success.
pub async fn run_captured(command: &mut Command) -> Result<String, ExecError> {
  let cmd = describe(command);
  debug!(cmd = %cmd, "running");

  let output = command.output().await.map_err(|source| ExecError::Spawn {
    program: program_name(command),
    source,
  })?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command stdout");
    }

    return Err(ExecError::Failed {
      cmd,
      code: output.status.code(),
    });
  }

  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Render a command as a copy-pasteable command line.
pub fn describe(command: &Command) -> String {
  let std_command = command.as_std();
  std::iter::once(std_command.get_program())
    .chain(std_command.get_args())
    .map(escape_arg)
    .collect::<Vec<_>>()
    .join(" ")
}

fn program_name(command: &Command) -> String {
  command.as_std().get_program().to_string_lossy().to_string()
}

/// Escape embedded double quotes and quote arguments containing spaces.
fn escape_arg(arg: &OsStr) -> String {
  let escaped = arg.to_string_lossy().replace('"', "\\\"");
  if escaped.contains(' ') {
    format!("\"{}\"", escaped)
  } else {
    escaped
  }
}

/// Convenience for passing paths as `-D` style cmake arguments.
pub fn define(name: &str, value: impl AsRef<Path>) -> OsString {
  let mut arg = OsString::from(format!("-D{}=", name));
  arg.push(value.as_ref());
  arg
}
