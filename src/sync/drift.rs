//! Drift correction: the driver keeps broadcasting its position while playing.
//!
//! Differences in decode or buffering latency never show up as player events,
//! so the follower would drift without this.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::{deliver, Message};
use crate::player::Player;
use crate::transport::MessageSink;

/// Broadcast `[SEEK];<position>` every `period` while the player is playing.
///
/// Parks on the playing state while paused. Returns once the link closes.
pub async fn run(
  player: Arc<dyn Player>,
  sink: Arc<dyn MessageSink>,
  period: Duration,
  send_timeout: Duration,
) {
  log::info!("Drift correction started, every {:?}", period);

  let mut playing = player.playing_changes();
  let mut ticker = interval_at(Instant::now() + period, period);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

  loop {
    if !player.is_playing() {
      log::debug!("Drift correction idle until playback resumes");
      if playing.wait_for(|p| *p).await.is_err() {
        break;
      }
      ticker.reset();
    }

    if !sink.is_open() {
      break;
    }

    match player.current_position().await {
      Ok(position) if position >= 0 => {
        deliver(sink.as_ref(), &Message::Seek(position), send_timeout).await;
      }
      Ok(_) => {}
      Err(e) => log::debug!("Skipping drift broadcast: {}", e),
    }

    ticker.tick().await;
  }

  log::info!("Drift correction stopped");
}
