//! Startup errors. Once a session runs, nothing is fatal.

use flexi_logger::FlexiLoggerError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::mpv::MpvError;
use crate::player::PlayerError;
use crate::transport::ChannelError;

#[derive(Error, Debug)]
pub enum AppError {
  #[error("Logger initialization error: {0}")]
  Logger(#[from] FlexiLoggerError),

  #[error("Config error: {0}")]
  Config(#[from] ConfigError),

  #[error("MPV error: {0}")]
  Mpv(#[from] MpvError),

  #[error("Player error: {0}")]
  Player(#[from] PlayerError),

  #[error("Peer link error: {0}")]
  Channel(#[from] ChannelError),

  #[error("--video is required when driving playback")]
  MissingVideo,
}
