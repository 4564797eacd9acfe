//! One sync session over one peer link.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::executor::{Executor, Outcome};
use super::{bridge, deliver, drift, Message, Role, SyncOptions};
use crate::player::Player;
use crate::transport::PeerLink;

/// Ties a local player to a peer for the lifetime of the link.
pub struct Session {
  player: Arc<dyn Player>,
  role: Role,
  options: SyncOptions,
}

impl Session {
  pub fn new(player: Arc<dyn Player>, role: Role, options: SyncOptions) -> Self {
    Self {
      player,
      role,
      options,
    }
  }

  /// Run until the peer goes away.
  ///
  /// Starts the event bridge right away, opens the handshake on the driver,
  /// and starts drift correction once the follower has answered.
  pub async fn run(self, link: PeerLink) {
    let PeerLink { sink, mut incoming } = link;
    log::info!("Session started as {:?}", self.role);

    let bridge_task: Option<JoinHandle<()>> = match self.player.events() {
      Some(events) => Some(tokio::spawn(bridge::run(
        events,
        self.role,
        sink.clone(),
        self.options.send_timeout,
      ))),
      None => {
        log::warn!("Player events already taken, local changes will not be forwarded");
        None
      }
    };

    if self.role == Role::Driver {
      deliver(sink.as_ref(), &Message::Echo, self.options.send_timeout).await;
    }

    let executor = Executor::new(self.player.clone(), self.role, self.options.clone());
    let mut drift_task: Option<JoinHandle<()>> = None;

    while let Some(text) = incoming.recv().await {
      let outcome = executor.execute(&text, sink.as_ref()).await;

      if outcome == Outcome::Handshake && self.role == Role::Driver && drift_task.is_none() {
        log::info!("Handshake complete");
        drift_task = Some(tokio::spawn(drift::run(
          self.player.clone(),
          sink.clone(),
          self.options.sync_interval,
          self.options.send_timeout,
        )));
      }
    }

    log::info!("Peer link closed, ending session");
    for task in [bridge_task, drift_task].into_iter().flatten() {
      task.abort();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::player::fake::{Call, FakePlayer};
  use crate::player::PlayerEvent;
  use crate::transport::{pair, MessageSink};
  use std::path::PathBuf;
  use std::time::Duration;

  fn options(reference: Option<&str>) -> SyncOptions {
    SyncOptions {
      media_root: PathBuf::from("/media"),
      local_reference: reference.map(str::to_string),
      ..SyncOptions::default()
    }
  }

  #[tokio::test]
  async fn test_driver_opens_with_echo_then_announces() {
    let player = Arc::new(FakePlayer::new(0));
    let (local, mut peer) = pair();
    let session = Session::new(player.clone(), Role::Driver, options(Some("film.mkv")));
    let task = tokio::spawn(session.run(local));

    assert_eq!(peer.incoming.recv().await.as_deref(), Some("ECHO"));
    assert!(player.calls().is_empty());

    peer.sink.send("ECHO").await.unwrap();
    assert_eq!(peer.incoming.recv().await.as_deref(), Some("[VIDEO];film.mkv"));
    let expected = PathBuf::from("/media").join("film.mkv");
    assert_eq!(
      player.wait_for_calls(1).await,
      vec![Call::Load(expected.to_string_lossy().into_owned())]
    );

    drop(peer);
    tokio::time::timeout(Duration::from_secs(1), task)
      .await
      .unwrap()
      .unwrap();
  }

  #[tokio::test]
  async fn test_follower_forwards_local_events() {
    let player = Arc::new(FakePlayer::new(0));
    let (local, mut peer) = pair();
    let session = Session::new(player.clone(), Role::Follower, options(None));
    let task = tokio::spawn(session.run(local));

    player.event_tx.send(PlayerEvent::Pause).unwrap();
    player
      .event_tx
      .send(PlayerEvent::StartFile("/tmp/x.mkv".into()))
      .unwrap();
    player.event_tx.send(PlayerEvent::Seek(33)).unwrap();

    assert_eq!(peer.incoming.recv().await.as_deref(), Some("[PAUSE];"));
    assert_eq!(peer.incoming.recv().await.as_deref(), Some("[SEEK];33"));

    drop(peer);
    task.await.unwrap();
  }

  #[tokio::test(start_paused = true)]
  async fn test_drift_waits_for_handshake() {
    let player = Arc::new(FakePlayer::new(60));
    player.set_playing(true);
    let (local, mut peer) = pair();
    let session = Session::new(player.clone(), Role::Driver, options(Some("film.mkv")));
    let task = tokio::spawn(session.run(local));

    assert_eq!(peer.incoming.recv().await.as_deref(), Some("ECHO"));
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(peer.incoming.try_recv().is_err());

    peer.sink.send("ECHO").await.unwrap();
    assert_eq!(peer.incoming.recv().await.as_deref(), Some("[VIDEO];film.mkv"));
    assert_eq!(peer.incoming.recv().await.as_deref(), Some("[SEEK];60"));

    task.abort();
  }
}
