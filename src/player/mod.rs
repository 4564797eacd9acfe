//! Player capability interface.
//!
//! The sync core only talks to a media player through [`Player`]. The mpv
//! implementation lives in [`crate::mpv::MpvPlayer`].

mod event;
#[cfg(test)]
pub(crate) mod fake;
mod suppress;

pub use event::{EventKind, PlayerEvent};
pub use suppress::SuppressionToken;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::mpv::MpvError;

/// Normalized events from the local player, in the order they happened.
pub type EventStream = mpsc::UnboundedReceiver<PlayerEvent>;

#[derive(Error, Debug)]
pub enum PlayerError {
  #[error("Player control failed: {0}")]
  Control(#[from] MpvError),
  #[error("Position unavailable")]
  PositionUnavailable,
  #[error("Empty media reference")]
  EmptyReference,
}

/// Control surface of a local media player.
///
/// Every mutating call records the event it will cause so the adapter's event
/// stream does not report it back.
#[async_trait]
pub trait Player: Send + Sync {
  /// Load and start playing `reference` (path or URL).
  async fn load(&self, reference: &str) -> Result<(), PlayerError>;

  async fn pause(&self) -> Result<(), PlayerError>;

  async fn resume(&self) -> Result<(), PlayerError>;

  /// Seek to an absolute position in whole seconds.
  async fn seek_absolute(&self, seconds: i64) -> Result<(), PlayerError>;

  /// Current position in whole seconds.
  async fn current_position(&self) -> Result<i64, PlayerError>;

  fn is_playing(&self) -> bool;

  /// Watch channel tracking [`Player::is_playing`].
  fn playing_changes(&self) -> watch::Receiver<bool>;

  /// Take the live event subscription. Only the first call gets it.
  fn events(&self) -> Option<EventStream>;
}
