//! Scriptable in-memory player for unit tests.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use super::{EventStream, Player, PlayerError, PlayerEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  Load(String),
  Pause,
  Resume,
  Seek(i64),
}

pub struct FakePlayer {
  calls: Mutex<Vec<Call>>,
  position: Mutex<Option<i64>>,
  playing: watch::Sender<bool>,
  events: Mutex<Option<EventStream>>,
  pub event_tx: mpsc::UnboundedSender<PlayerEvent>,
}

impl FakePlayer {
  pub fn new(position: i64) -> Self {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (playing, _) = watch::channel(false);
    Self {
      calls: Mutex::new(Vec::new()),
      position: Mutex::new(Some(position)),
      playing,
      events: Mutex::new(Some(event_rx)),
      event_tx,
    }
  }

  pub fn set_position(&self, position: Option<i64>) {
    *self.position.lock() = position;
  }

  pub fn set_playing(&self, playing: bool) {
    self.playing.send_replace(playing);
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().clone()
  }

  /// Wait until at least `count` calls were made, for spawned loads.
  pub async fn wait_for_calls(&self, count: usize) -> Vec<Call> {
    for _ in 0..100 {
      if self.calls.lock().len() >= count {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    self.calls()
  }
}

#[async_trait]
impl Player for FakePlayer {
  async fn load(&self, reference: &str) -> Result<(), PlayerError> {
    self.calls.lock().push(Call::Load(reference.to_string()));
    Ok(())
  }

  async fn pause(&self) -> Result<(), PlayerError> {
    self.calls.lock().push(Call::Pause);
    Ok(())
  }

  async fn resume(&self) -> Result<(), PlayerError> {
    self.calls.lock().push(Call::Resume);
    Ok(())
  }

  async fn seek_absolute(&self, seconds: i64) -> Result<(), PlayerError> {
    self.calls.lock().push(Call::Seek(seconds));
    Ok(())
  }

  async fn current_position(&self) -> Result<i64, PlayerError> {
    self.position.lock().ok_or(PlayerError::PositionUnavailable)
  }

  fn is_playing(&self) -> bool {
    *self.playing.borrow()
  }

  fn playing_changes(&self) -> watch::Receiver<bool> {
    self.playing.subscribe()
  }

  fn events(&self) -> Option<EventStream> {
    self.events.lock().take()
  }
}
