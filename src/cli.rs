use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;
use crate::sync::Role;

#[derive(Parser, Debug)]
#[command(
  name = "mpvsync",
  about = "Keep two mpv players in sync over a peer link.",
  version
)]
pub struct Cli {
  /// Connect to a waiting peer (ws://host:port) and drive playback
  #[arg(long, value_name = "URL", conflicts_with = "listen", required_unless_present = "listen")]
  pub connect: Option<String>,

  /// Wait for a peer on this address (host:port) and follow its playback
  #[arg(long, value_name = "ADDR")]
  pub listen: Option<String>,

  /// Video location or URL, relative to the media root unless absolute
  #[arg(long)]
  pub video: Option<String>,

  /// Base directory for videos [default: working directory]
  #[arg(long, value_name = "DIR")]
  pub basedir: Option<String>,

  /// Config file [default: <config dir>/mpvsync/config.toml]
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// MPV executable
  #[arg(long, value_name = "PATH")]
  pub mpv: Option<String>,

  /// Ignore remote seeks within this many seconds of the local position
  #[arg(long, value_name = "SECS")]
  pub seek_threshold: Option<u32>,

  /// Seconds between drift-correction broadcasts
  #[arg(long, value_name = "SECS")]
  pub sync_interval: Option<u32>,

  /// Log level or flexi_logger spec
  #[arg(long, default_value = "info")]
  pub log_level: String,

  /// Write rotated log files here instead of stderr
  #[arg(long, value_name = "DIR")]
  pub log_dir: Option<PathBuf>,
}

impl Cli {
  /// The side that connects drives.
  pub fn role(&self) -> Role {
    if self.connect.is_some() {
      Role::Driver
    } else {
      Role::Follower
    }
  }

  /// Command-line values win over the config file.
  pub fn apply(&self, config: &mut AppConfig) {
    if let Some(mpv) = &self.mpv {
      config.mpv_path = Some(mpv.clone());
    }
    if let Some(basedir) = &self.basedir {
      config.media_root = Some(basedir.clone());
    }
    if let Some(threshold) = self.seek_threshold {
      config.seek_threshold_secs = threshold;
    }
    if let Some(interval) = self.sync_interval {
      config.sync_interval_secs = interval;
    }
  }
}
