//! Forwards local player events to the peer.

use std::sync::Arc;
use std::time::Duration;

use super::{deliver, Message, Role};
use crate::player::{EventStream, PlayerEvent};
use crate::transport::MessageSink;

/// Wire message for a local event, if the peer should hear about it.
///
/// Negative seek positions are failed reads, not seeks. Only the driver
/// announces file changes.
pub fn encode(event: &PlayerEvent, role: Role) -> Option<Message> {
  match event {
    PlayerEvent::Pause => Some(Message::Pause),
    PlayerEvent::Unpause => Some(Message::Unpause),
    PlayerEvent::Seek(position) if *position >= 0 => Some(Message::Seek(*position)),
    PlayerEvent::Seek(_) => None,
    PlayerEvent::StartFile(location) => match role {
      Role::Driver => Some(Message::Video(location.clone())),
      Role::Follower => None,
    },
  }
}

/// Drain `events` into `sink` until the player stops producing them.
///
/// A failed send is dropped; the next event or drift broadcast supersedes it.
pub async fn run(
  mut events: EventStream,
  role: Role,
  sink: Arc<dyn MessageSink>,
  send_timeout: Duration,
) {
  log::info!("Event bridge started as {:?}", role);

  while let Some(event) = events.recv().await {
    match encode(&event, role) {
      Some(message) => {
        deliver(sink.as_ref(), &message, send_timeout).await;
      }
      None => log::debug!("Not forwarding {:?}", event),
    }
  }

  log::info!("Event bridge stopped");
}
