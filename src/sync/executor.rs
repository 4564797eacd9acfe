//! Applies commands received from the peer to the local player.

use std::path::Path;
use std::sync::Arc;

use url::Url;

use super::{deliver, Message, ParseError, Role, SyncOptions};
use crate::player::{Player, PlayerError};
use crate::transport::MessageSink;

/// What handling one inbound message amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// ECHO answered; on the driver this completes the handshake.
  Handshake,
  /// The command was handed to the player.
  Applied,
  /// A SEEK within the threshold, nothing to do.
  Skipped,
  /// Malformed, unknown or unparseable message.
  Discarded,
  /// The player rejected the command.
  Failed,
}

/// Turn a VIDEO payload into something the player can load.
///
/// Absolute URLs pass through, everything else is taken relative to `media_root`.
pub fn resolve_reference(media_root: &Path, reference: &str) -> String {
  match Url::parse(reference) {
    Ok(url) if url.host_str().is_some() => reference.to_string(),
    _ => media_root.join(reference).to_string_lossy().into_owned(),
  }
}

pub struct Executor {
  player: Arc<dyn Player>,
  role: Role,
  options: SyncOptions,
}

impl Executor {
  pub fn new(player: Arc<dyn Player>, role: Role, options: SyncOptions) -> Self {
    Self {
      player,
      role,
      options,
    }
  }

  /// Handle one inbound message. Never fails; problems are logged.
  pub async fn execute(&self, text: &str, reply: &dyn MessageSink) -> Outcome {
    let message = match Message::parse(text) {
      Ok(message) => message,
      Err(ParseError::Malformed(_)) => return Outcome::Discarded,
      Err(ParseError::UnknownTag(tag)) => {
        log::debug!("Ignoring unknown command {}", tag);
        return Outcome::Discarded;
      }
      Err(e) => {
        log::warn!("Dropping {:?}: {}", text, e);
        return Outcome::Discarded;
      }
    };

    log::debug!("Peer: {}", message);

    match message {
      Message::Echo => self.answer_echo(reply).await,
      Message::Video(reference) => {
        self.dispatch_load(&reference);
        Outcome::Applied
      }
      Message::Seek(target) => self.reconcile_seek(target).await,
      Message::Pause => Self::applied(self.player.pause().await),
      Message::Unpause => Self::applied(self.player.resume().await),
    }
  }

  async fn answer_echo(&self, reply: &dyn MessageSink) -> Outcome {
    match self.role {
      Role::Follower => {
        deliver(reply, &Message::Echo, self.options.send_timeout).await;
      }
      Role::Driver => match &self.options.local_reference {
        Some(reference) => {
          let announce = Message::Video(reference.clone());
          deliver(reply, &announce, self.options.send_timeout).await;
          self.dispatch_load(reference);
        }
        None => log::warn!("Peer is ready but there is no local media to announce"),
      },
    }
    Outcome::Handshake
  }

  /// Start loading without waiting; a slow load must not hold up later commands.
  fn dispatch_load(&self, reference: &str) {
    let resolved = resolve_reference(&self.options.media_root, reference);
    let player = self.player.clone();
    tokio::spawn(async move {
      if let Err(e) = player.load(&resolved).await {
        log::error!("Failed to load {}: {}", resolved, e);
      }
    });
  }

  async fn reconcile_seek(&self, target: i64) -> Outcome {
    // mpv reads a negative absolute seek as an offset from the end
    if target < 0 {
      log::debug!("Ignoring seek to negative position {}", target);
      return Outcome::Discarded;
    }

    let current = match self.player.current_position().await {
      Ok(current) => Some(current),
      Err(e) => {
        log::debug!("Position unknown before seek: {}", e);
        None
      }
    };

    if let Some(current) = current {
      if (current - target).abs() <= self.options.seek_threshold_secs {
        return Outcome::Skipped;
      }
    }

    Self::applied(self.player.seek_absolute(target).await)
  }

  fn applied(result: Result<(), PlayerError>) -> Outcome {
    match result {
      Ok(()) => Outcome::Applied,
      Err(e) => {
        log::error!("Player command failed: {}", e);
        Outcome::Failed
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::player::fake::{Call, FakePlayer};
  use crate::player::PlayerEvent;
  use crate::sync::bridge;
  use crate::transport::{pair, PeerLink};
  use std::path::PathBuf;
  use std::time::Duration;

  fn options() -> SyncOptions {
    SyncOptions {
      media_root: PathBuf::from("/srv/media"),
      local_reference: Some("movie.mkv".into()),
      ..SyncOptions::default()
    }
  }

  fn setup(role: Role, position: i64) -> (Arc<FakePlayer>, Executor, PeerLink, PeerLink) {
    let player = Arc::new(FakePlayer::new(position));
    let executor = Executor::new(player.clone(), role, options());
    let (local, remote) = pair();
    (player, executor, local, remote)
  }

  #[tokio::test]
  async fn test_seek_threshold() {
    let (player, executor, local, _remote) = setup(Role::Follower, 10);
    let sink = local.sink.as_ref();

    assert_eq!(executor.execute("[SEEK];11", sink).await, Outcome::Skipped);
    assert_eq!(executor.execute("[SEEK];9", sink).await, Outcome::Skipped);
    assert_eq!(executor.execute("[SEEK];10", sink).await, Outcome::Skipped);
    assert!(player.calls().is_empty());

    assert_eq!(executor.execute("[SEEK];12", sink).await, Outcome::Applied);
    assert_eq!(executor.execute("[SEEK];8", sink).await, Outcome::Applied);
    assert_eq!(player.calls(), vec![Call::Seek(12), Call::Seek(8)]);
  }

  #[tokio::test]
  async fn test_configured_threshold() {
    let player = Arc::new(FakePlayer::new(100));
    let executor = Executor::new(
      player.clone(),
      Role::Follower,
      SyncOptions {
        seek_threshold_secs: 3,
        ..options()
      },
    );
    let (local, _remote) = pair();

    assert_eq!(executor.execute("[SEEK];103", local.sink.as_ref()).await, Outcome::Skipped);
    assert_eq!(executor.execute("[SEEK];104", local.sink.as_ref()).await, Outcome::Applied);
    assert_eq!(player.calls(), vec![Call::Seek(104)]);
  }

  #[tokio::test]
  async fn test_seek_with_unknown_position_applies() {
    let (player, executor, local, _remote) = setup(Role::Follower, 0);
    player.set_position(None);
    assert_eq!(executor.execute("[SEEK];1", local.sink.as_ref()).await, Outcome::Applied);
    assert_eq!(player.calls(), vec![Call::Seek(1)]);
  }

  #[tokio::test]
  async fn test_malformed_messages_do_nothing() {
    let (player, executor, local, mut remote) = setup(Role::Driver, 0);
    for text in ["", "[PAUSE]", "[SEEK];1;2", "[VIDEO];a;b", ";;", "[UNPAUSE]"] {
      assert_eq!(executor.execute(text, local.sink.as_ref()).await, Outcome::Discarded);
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(player.calls().is_empty());
    assert!(remote.incoming.try_recv().is_err());
  }

  #[tokio::test]
  async fn test_negative_seek_ignored() {
    let (player, executor, local, _remote) = setup(Role::Follower, 50);
    assert_eq!(executor.execute("[SEEK];-3", local.sink.as_ref()).await, Outcome::Discarded);
    assert!(player.calls().is_empty());

    player.set_position(None);
    assert_eq!(executor.execute("[SEEK];-1", local.sink.as_ref()).await, Outcome::Discarded);
    assert!(player.calls().is_empty());
  }

  #[tokio::test]
  async fn test_unknown_tag_and_bad_seek_ignored() {
    let (player, executor, local, _remote) = setup(Role::Follower, 0);
    assert_eq!(executor.execute("[STOP];", local.sink.as_ref()).await, Outcome::Discarded);
    assert_eq!(executor.execute("[SEEK];soon", local.sink.as_ref()).await, Outcome::Discarded);
    assert!(player.calls().is_empty());
  }

  #[tokio::test]
  async fn test_pause_and_unpause() {
    let (player, executor, local, _remote) = setup(Role::Follower, 0);
    assert_eq!(executor.execute("[PAUSE];", local.sink.as_ref()).await, Outcome::Applied);
    assert_eq!(executor.execute("[UNPAUSE];", local.sink.as_ref()).await, Outcome::Applied);
    assert_eq!(player.calls(), vec![Call::Pause, Call::Resume]);
  }

  #[tokio::test]
  async fn test_video_resolution() {
    let (player, executor, local, _remote) = setup(Role::Follower, 0);
    executor
      .execute("[VIDEO];https://cdn.example.com/a.mp4", local.sink.as_ref())
      .await;
    let calls = player.wait_for_calls(1).await;
    assert_eq!(calls, vec![Call::Load("https://cdn.example.com/a.mp4".into())]);

    executor.execute("[VIDEO];shows/ep1.mkv", local.sink.as_ref()).await;
    let calls = player.wait_for_calls(2).await;
    let expected = PathBuf::from("/srv/media").join("shows/ep1.mkv");
    assert_eq!(calls[1], Call::Load(expected.to_string_lossy().into_owned()));
  }

  #[test]
  fn test_resolve_reference() {
    let root = Path::new("/videos");
    assert_eq!(
      resolve_reference(root, "http://host:8080/stream"),
      "http://host:8080/stream"
    );
    assert_eq!(
      resolve_reference(root, "clip.webm"),
      root.join("clip.webm").to_string_lossy()
    );
    // a scheme without a host is not a network reference
    assert_eq!(
      resolve_reference(root, "c:/clips/a.mkv"),
      root.join("c:/clips/a.mkv").to_string_lossy()
    );
  }

  #[tokio::test]
  async fn test_follower_answers_echo_with_echo() {
    let (player, executor, local, mut remote) = setup(Role::Follower, 0);
    assert_eq!(executor.execute("ECHO", local.sink.as_ref()).await, Outcome::Handshake);
    assert_eq!(remote.incoming.recv().await.as_deref(), Some("ECHO"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(player.calls().is_empty());
  }

  #[tokio::test]
  async fn test_driver_answers_echo_with_video_and_loads() {
    let (player, executor, local, mut remote) = setup(Role::Driver, 0);
    assert_eq!(executor.execute("ECHO", local.sink.as_ref()).await, Outcome::Handshake);
    assert_eq!(remote.incoming.recv().await.as_deref(), Some("[VIDEO];movie.mkv"));

    let expected = PathBuf::from("/srv/media").join("movie.mkv");
    assert_eq!(
      player.wait_for_calls(1).await,
      vec![Call::Load(expected.to_string_lossy().into_owned())]
    );
  }

  #[tokio::test]
  async fn test_bridge_output_drives_executor() {
    let message = bridge::encode(&PlayerEvent::Seek(42), Role::Driver).unwrap();
    assert_eq!(message.to_string(), "[SEEK];42");

    let (player, executor, local, _remote) = setup(Role::Follower, 0);
    executor.execute(&message.to_string(), local.sink.as_ref()).await;
    assert_eq!(player.calls(), vec![Call::Seek(42)]);
  }
}
