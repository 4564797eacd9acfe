//! Peer link between the two players.
//!
//! A link is a reliable, ordered text channel: an outbound [`MessageSink`]
//! plus a receiver of inbound messages that ends when the peer goes away.
//!
//! - `websocket.rs` - WebSocket link (driver connects, follower accepts)
//! - `memory.rs` - In-process link pair

mod memory;
mod websocket;

pub use memory::{pair, MemorySink};
pub use websocket::{connect, WsListener};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
pub enum ChannelError {
  #[error("Channel closed")]
  Closed,
  #[error("Send timed out")]
  Timeout,
  #[error("WebSocket error: {0}")]
  WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

/// Outbound half of a peer link.
#[async_trait]
pub trait MessageSink: Send + Sync {
  async fn send(&self, text: &str) -> Result<(), ChannelError>;

  fn is_open(&self) -> bool;
}

/// An established peer link.
pub struct PeerLink {
  pub sink: Arc<dyn MessageSink>,
  pub incoming: mpsc::Receiver<String>,
}
