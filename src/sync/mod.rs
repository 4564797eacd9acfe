//! Peer synchronization core.
//!
//! - `protocol.rs` - Wire grammar
//! - `bridge.rs` - Local player events to outbound messages
//! - `executor.rs` - Inbound messages applied to the local player
//! - `drift.rs` - Periodic position broadcast on the driving side
//! - `session.rs` - Runs the above against one peer link

pub mod bridge;
pub mod drift;
pub mod executor;
pub mod protocol;
mod session;

pub use executor::{Executor, Outcome};
pub use protocol::{Message, ParseError};
pub use session::Session;

use std::path::PathBuf;
use std::time::Duration;

use crate::transport::MessageSink;

/// Which side of the link this endpoint is. Fixed for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  /// Opened the link; owns the media selection and runs drift correction.
  Driver,
  /// Accepted the link; mirrors the driver.
  Follower,
}

/// Tunables for one sync session.
#[derive(Debug, Clone)]
pub struct SyncOptions {
  /// A SEEK is applied only when local and remote differ by more than this.
  pub seek_threshold_secs: i64,
  /// Period of the drift-correction broadcast.
  pub sync_interval: Duration,
  /// Upper bound on a single outbound send.
  pub send_timeout: Duration,
  /// Base directory for relative VIDEO references.
  pub media_root: PathBuf,
  /// The driver's media reference, announced on handshake.
  pub local_reference: Option<String>,
}

impl Default for SyncOptions {
  fn default() -> Self {
    Self {
      seek_threshold_secs: 1,
      sync_interval: Duration::from_secs(5),
      send_timeout: Duration::from_secs(2),
      media_root: PathBuf::from("."),
      local_reference: None,
    }
  }
}

/// Send one message, logging instead of failing. Returns whether it went out.
pub(crate) async fn deliver(sink: &dyn MessageSink, message: &Message, timeout: Duration) -> bool {
  let text = message.to_string();
  match tokio::time::timeout(timeout, sink.send(&text)).await {
    Ok(Ok(())) => {
      log::debug!("Sent {}", text);
      true
    }
    Ok(Err(e)) => {
      log::warn!("Failed to send {}: {}", text, e);
      false
    }
    Err(_) => {
      log::warn!("Sending {} timed out after {:?}", text, timeout);
      false
    }
  }
}
