//! MPV process detection and spawning.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ProcessError {
  #[error("MPV executable not found")]
  NotFound,
  #[error("Failed to spawn MPV: {0}")]
  SpawnFailed(#[from] std::io::Error),
}

/// Build a fresh IPC socket/pipe path so several instances can run side by side.
pub fn unique_ipc_path() -> String {
  let id = Uuid::new_v4();
  #[cfg(windows)]
  {
    format!(r"\\.\pipe\mpvsync-{}", id)
  }
  #[cfg(not(windows))]
  {
    std::env::temp_dir()
      .join(format!("mpvsync-{}.sock", id))
      .to_string_lossy()
      .into_owned()
  }
}

/// Find MPV executable in common locations.
pub fn find_mpv() -> Option<PathBuf> {
  if let Ok(path) = which::which("mpv") {
    return Some(path);
  }

  #[cfg(windows)]
  let common_paths: &[&str] = &[
    r"C:\Program Files\mpv\mpv.exe",
    r"C:\Program Files (x86)\mpv\mpv.exe",
    r"C:\mpv\mpv.exe",
  ];
  #[cfg(target_os = "macos")]
  let common_paths: &[&str] = &[
    "/usr/local/bin/mpv",
    "/opt/homebrew/bin/mpv",
    "/Applications/mpv.app/Contents/MacOS/mpv",
  ];
  #[cfg(not(any(windows, target_os = "macos")))]
  let common_paths: &[&str] = &["/usr/bin/mpv", "/usr/local/bin/mpv"];

  common_paths.iter().map(PathBuf::from).find(|p| p.exists())
}

/// Spawn an idle MPV process serving IPC on `ipc`.
pub fn spawn_mpv(
  mpv_path: Option<&Path>,
  ipc: &str,
  extra_args: &[String],
) -> Result<Child, ProcessError> {
  let mpv_exe = mpv_path
    .map(Path::to_path_buf)
    .or_else(find_mpv)
    .ok_or(ProcessError::NotFound)?;

  log::info!("Spawning MPV: {:?} with IPC: {}", mpv_exe, ipc);
  if !extra_args.is_empty() {
    log::info!("Extra MPV args: {:?}", extra_args);
  }

  let child = Command::new(&mpv_exe)
    .arg(format!("--input-ipc-server={}", ipc))
    .arg("--idle")
    .arg("--force-window")
    .arg("--keep-open=no")
    .arg("--no-terminal")
    .args(extra_args)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()?;

  Ok(child)
}

/// Remove a stale IPC socket.
pub fn cleanup_ipc(path: &str) {
  #[cfg(not(windows))]
  {
    let _ = std::fs::remove_file(path);
  }
  // Windows named pipes are cleaned up automatically
  #[cfg(windows)]
  let _ = path;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ipc_paths_differ() {
    assert_ne!(unique_ipc_path(), unique_ipc_path());
  }

  #[test]
  fn test_spawn_with_missing_binary() {
    let missing = Path::new("/nonexistent/definitely-not-mpv");
    let result = spawn_mpv(Some(missing), &unique_ipc_path(), &[]);
    assert!(matches!(result, Err(ProcessError::SpawnFailed(_))));
  }
}
