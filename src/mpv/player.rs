//! [`Player`] implementation backed by an mpv IPC connection.
//!
//! Pause state comes from observing the `pause` property; seeks and file
//! starts come from mpv's own `seek` / `start-file` events.

use std::sync::Arc;

use async_channel::Receiver;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::client::{MpvClient, MpvError};
use super::protocol::MpvEvent;
use crate::player::{EventKind, EventStream, Player, PlayerError, PlayerEvent, SuppressionToken};

/// Observer ID for the pause property.
const OBS_PAUSE: i64 = 1;

#[derive(Debug, Default)]
struct Status {
  /// Last observed pause property; None until mpv reports it.
  paused: Option<bool>,
  has_file: bool,
  /// Last reference handed to `load`.
  reference: Option<String>,
}

/// State shared between the control methods and the listener task.
struct Shared {
  token: SuppressionToken,
  status: Mutex<Status>,
  playing: watch::Sender<bool>,
}

impl Shared {
  fn new() -> Self {
    let (playing, _) = watch::channel(false);
    Self {
      token: SuppressionToken::new(),
      status: Mutex::new(Status::default()),
      playing,
    }
  }

  /// Fold an mpv event into the status and say which notification it is, if any.
  fn observe(&self, event: &MpvEvent) -> Option<EventKind> {
    let mut status = self.status.lock();
    let kind = match event.event.as_str() {
      "property-change" if event.id == Some(OBS_PAUSE) => {
        let paused = event.data.as_ref().and_then(|d| d.as_bool())?;
        match status.paused.replace(paused) {
          // First report is the current value, not a change
          None => None,
          Some(previous) if previous == paused => None,
          Some(_) if paused => Some(EventKind::Pause),
          Some(_) => Some(EventKind::Unpause),
        }
      }
      "seek" => Some(EventKind::Seek),
      "start-file" => Some(EventKind::StartFile),
      "file-loaded" => {
        status.has_file = true;
        None
      }
      "end-file" | "idle" => {
        status.has_file = false;
        None
      }
      _ => None,
    };

    let playing = status.has_file && status.paused == Some(false);
    self.playing.send_if_modified(|current| {
      let changed = *current != playing;
      *current = playing;
      changed
    });
    kind
  }

  fn paused(&self) -> Option<bool> {
    self.status.lock().paused
  }

  /// Move a known pause state to `paused`; false if it was unknown or already there.
  fn expect_paused(&self, paused: bool) -> bool {
    let mut status = self.status.lock();
    match status.paused {
      Some(current) if current != paused => {
        status.paused = Some(paused);
        true
      }
      _ => false,
    }
  }
}

/// mpv behind the [`Player`] capability interface.
pub struct MpvPlayer {
  client: MpvClient,
  shared: Arc<Shared>,
  events: Mutex<Option<EventStream>>,
  listener: JoinHandle<()>,
}

impl MpvPlayer {
  /// Attach to a connected client and start translating its events.
  pub async fn attach(client: MpvClient) -> Result<Self, PlayerError> {
    let mpv_events = client.events().ok_or(MpvError::NotConnected)?;
    client.observe_property(OBS_PAUSE, "pause").await?;

    let shared = Arc::new(Shared::new());
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = tokio::spawn(Self::listen(client.clone(), shared.clone(), mpv_events, tx));

    Ok(Self {
      client,
      shared,
      events: Mutex::new(Some(rx)),
      listener,
    })
  }

  async fn listen(
    client: MpvClient,
    shared: Arc<Shared>,
    mpv_events: Receiver<MpvEvent>,
    tx: mpsc::UnboundedSender<PlayerEvent>,
  ) {
    log::info!("MPV event listener started");

    while let Ok(event) = mpv_events.recv().await {
      let Some(kind) = shared.observe(&event) else {
        continue;
      };

      if shared.token.take_if(kind) {
        log::debug!("Dropping self-caused {} notification", kind);
        continue;
      }

      let event = match kind {
        EventKind::Pause => PlayerEvent::Pause,
        EventKind::Unpause => PlayerEvent::Unpause,
        EventKind::Seek => PlayerEvent::Seek(read_position(&client).await.unwrap_or(-1)),
        EventKind::StartFile => {
          let path = match client.get_path().await {
            Ok(path) => Some(path),
            Err(e) => {
              log::debug!("Path not readable on start-file: {}", e);
              shared.status.lock().reference.clone()
            }
          };
          match path {
            Some(path) => PlayerEvent::StartFile(path),
            None => continue,
          }
        }
      };

      log::debug!("Player event: {:?}", event);
      // Nobody listening is fine, the status above is still kept current
      let _ = tx.send(event);
    }

    log::warn!("MPV event stream ended");
    shared.playing.send_replace(false);
  }

  /// Run a control call with `kind` marked as self-caused.
  ///
  /// The token goes in before the command so the notification can never
  /// overtake it; a failed command takes it back out.
  async fn controlled<F>(&self, kind: Option<EventKind>, op: &str, call: F) -> Result<(), PlayerError>
  where
    F: std::future::Future<Output = Result<(), MpvError>>,
  {
    if let Some(kind) = kind {
      self.shared.token.record(kind);
    }

    if let Err(e) = call.await {
      if let Some(kind) = kind {
        self.shared.token.take_if(kind);
      }
      log::error!("Failed to {}: {}", op, e);
      return Err(e.into());
    }
    Ok(())
  }
}

async fn read_position(client: &MpvClient) -> Result<i64, PlayerError> {
  match client.get_time_pos().await {
    Ok(pos) if pos >= 0.0 => Ok(pos.trunc() as i64),
    Ok(_) | Err(MpvError::Unavailable(_)) => Err(PlayerError::PositionUnavailable),
    Err(e) => Err(e.into()),
  }
}

#[async_trait]
impl Player for MpvPlayer {
  async fn load(&self, reference: &str) -> Result<(), PlayerError> {
    if reference.is_empty() {
      return Err(PlayerError::EmptyReference);
    }

    self
      .controlled(
        Some(EventKind::StartFile),
        "load file",
        self.client.loadfile(reference),
      )
      .await?;
    self.shared.status.lock().reference = Some(reference.to_string());

    // Take the unpause as already seen so mpv's report of it is no transition
    if self.shared.expect_paused(false) {
      let resumed = self
        .controlled(None, "resume after load", self.client.set_pause(false))
        .await;
      if resumed.is_err() {
        self.shared.expect_paused(true);
      }
      resumed?;
    }
    Ok(())
  }

  async fn pause(&self) -> Result<(), PlayerError> {
    // mpv stays silent when the value doesn't change, so only then expect an echo
    let kind = (self.shared.paused() != Some(true)).then_some(EventKind::Pause);
    self.controlled(kind, "pause", self.client.set_pause(true)).await
  }

  async fn resume(&self) -> Result<(), PlayerError> {
    let kind = (self.shared.paused() != Some(false)).then_some(EventKind::Unpause);
    self.controlled(kind, "resume", self.client.set_pause(false)).await
  }

  async fn seek_absolute(&self, seconds: i64) -> Result<(), PlayerError> {
    self
      .controlled(Some(EventKind::Seek), "seek", self.client.seek(seconds as f64))
      .await
  }

  async fn current_position(&self) -> Result<i64, PlayerError> {
    read_position(&self.client).await
  }

  fn is_playing(&self) -> bool {
    *self.shared.playing.borrow()
  }

  fn playing_changes(&self) -> watch::Receiver<bool> {
    self.shared.playing.subscribe()
  }

  fn events(&self) -> Option<EventStream> {
    self.events.lock().take()
  }
}

impl Drop for MpvPlayer {
  fn drop(&mut self) {
    self.listener.abort();
  }
}
