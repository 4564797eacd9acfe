//! High-level MPV client with command methods.

use std::path::PathBuf;
use std::process::Child;
use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver;
use parking_lot::Mutex;
use thiserror::Error;

use super::ipc::{IpcError, MpvIpc};
use super::process::{cleanup_ipc, spawn_mpv, unique_ipc_path, ProcessError};
use super::protocol::{MpvCommand, MpvEvent, MpvResponse, PropertyValue};

#[derive(Error, Debug)]
pub enum MpvError {
  #[error("Process error: {0}")]
  Process(#[from] ProcessError),
  #[error("IPC error: {0}")]
  Ipc(#[from] IpcError),
  #[error("MPV command failed: {0}")]
  CommandFailed(String),
  #[error("Property {0} unavailable")]
  Unavailable(&'static str),
  #[error("Not connected")]
  NotConnected,
}

/// High-level MPV client.
#[derive(Clone)]
pub struct MpvClient {
  mpv_path: Option<PathBuf>,
  extra_args: Vec<String>,
  ipc_path: String,
  process: Arc<Mutex<Option<Child>>>,
  ipc: Arc<Mutex<Option<Arc<MpvIpc>>>>,
}

impl MpvClient {
  /// Create a new MPV client with its own IPC endpoint.
  pub fn new(mpv_path: Option<PathBuf>, extra_args: Vec<String>) -> Self {
    Self {
      mpv_path,
      extra_args,
      ipc_path: unique_ipc_path(),
      process: Arc::new(Mutex::new(None)),
      ipc: Arc::new(Mutex::new(None)),
    }
  }

  /// Wrap an existing IPC connection with no owned process.
  pub(crate) fn from_ipc(ipc: MpvIpc) -> Self {
    Self {
      mpv_path: None,
      extra_args: Vec::new(),
      ipc_path: String::new(),
      process: Arc::new(Mutex::new(None)),
      ipc: Arc::new(Mutex::new(Some(Arc::new(ipc)))),
    }
  }

  /// Start MPV and connect to IPC.
  pub async fn start(&self) -> Result<(), MpvError> {
    cleanup_ipc(&self.ipc_path);

    let child = spawn_mpv(self.mpv_path.as_deref(), &self.ipc_path, &self.extra_args)?;
    *self.process.lock() = Some(child);

    // Give MPV a moment to create the socket
    tokio::time::sleep(Duration::from_millis(500)).await;

    let ipc_conn = MpvIpc::connect(&self.ipc_path, 10).await?;
    *self.ipc.lock() = Some(Arc::new(ipc_conn));

    log::info!("MPV client connected on {}", self.ipc_path);
    Ok(())
  }

  /// Stop MPV and disconnect.
  pub async fn stop(&self) {
    if let Some(conn) = self.ipc.lock().take() {
      conn.close();
    }

    let child = self.process.lock().take();
    if let Some(mut child) = child {
      log::info!("Killing MPV process (pid: {:?})", child.id());

      // kill/wait block, keep them off the runtime threads
      let result = tokio::task::spawn_blocking(move || {
        let _ = child.kill();
        child.wait()
      })
      .await;

      match result {
        Ok(Ok(status)) => log::info!("MPV process exited with: {}", status),
        Ok(Err(e)) => log::error!("wait() failed: {}", e),
        Err(e) => log::error!("spawn_blocking panicked during process cleanup: {}", e),
      }
    }

    if !self.ipc_path.is_empty() {
      cleanup_ipc(&self.ipc_path);
    }
    log::info!("MPV client stopped");
  }

  fn get_ipc(&self) -> Result<Arc<MpvIpc>, MpvError> {
    self.ipc.lock().clone().ok_or(MpvError::NotConnected)
  }

  async fn send(&self, cmd: MpvCommand) -> Result<MpvResponse, MpvError> {
    let ipc = self.get_ipc()?;
    let response = ipc.send_command(cmd).await?;

    if !response.is_success() {
      return Err(MpvError::CommandFailed(response.error));
    }

    Ok(response)
  }

  /// Load a file for playback.
  pub async fn loadfile(&self, url: &str) -> Result<(), MpvError> {
    log::info!("Loading file: {}", url);
    self.send(MpvCommand::loadfile(url)).await?;
    Ok(())
  }

  /// Seek to absolute position in seconds.
  pub async fn seek(&self, time: f64) -> Result<(), MpvError> {
    self.send(MpvCommand::seek(time)).await?;
    Ok(())
  }

  /// Set pause state.
  pub async fn set_pause(&self, paused: bool) -> Result<(), MpvError> {
    self.send(MpvCommand::set_pause(paused)).await?;
    Ok(())
  }

  /// Get a property value.
  pub async fn get_property(&self, name: &str) -> Result<PropertyValue, MpvError> {
    let response = self.send(MpvCommand::get_property(name)).await?;
    Ok(
      response
        .data
        .map(PropertyValue::from)
        .unwrap_or(PropertyValue::Null),
    )
  }

  /// Get current time position in seconds.
  pub async fn get_time_pos(&self) -> Result<f64, MpvError> {
    match self.get_property("time-pos").await {
      Ok(PropertyValue::Number(n)) => Ok(n),
      // mpv answers "property unavailable" while idle
      Ok(_) | Err(MpvError::CommandFailed(_)) => Err(MpvError::Unavailable("time-pos")),
      Err(e) => Err(e),
    }
  }

  /// Get the path or URL of the current file.
  pub async fn get_path(&self) -> Result<String, MpvError> {
    match self.get_property("path").await {
      Ok(PropertyValue::String(s)) => Ok(s),
      Ok(_) | Err(MpvError::CommandFailed(_)) => Err(MpvError::Unavailable("path")),
      Err(e) => Err(e),
    }
  }

  /// Quit MPV gracefully.
  pub async fn quit(&self) {
    let _ = self.send(MpvCommand::quit()).await;
    self.stop().await;
  }

  /// Observe a property for changes.
  /// Changes arrive on events() with event="property-change".
  pub async fn observe_property(&self, observer_id: i64, property: &str) -> Result<(), MpvError> {
    self.send(MpvCommand::observe_property(observer_id, property)).await?;
    Ok(())
  }

  /// Get event receiver for property changes and other events.
  pub fn events(&self) -> Option<Receiver<MpvEvent>> {
    self.ipc.lock().as_ref().map(|ipc| ipc.events())
  }
}
