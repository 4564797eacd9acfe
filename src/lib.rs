use std::path::PathBuf;
use std::sync::Arc;

mod cli;
mod config;
mod error;
pub mod mpv;
pub mod player;
pub mod sync;
pub mod transport;

pub use cli::Cli;
pub use config::{AppConfig, ConfigError};
pub use error::AppError;

use clap::Parser;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};
use mpv::{MpvClient, MpvPlayer};
use sync::{Role, Session};
use transport::{PeerLink, WsListener};

fn init_logging(cli: &Cli) -> Result<LoggerHandle, AppError> {
  let logger = Logger::try_with_str(&cli.log_level)?;
  let handle = match &cli.log_dir {
    Some(dir) => logger
      .log_to_file(FileSpec::default().directory(dir))
      .rotate(
        Criterion::Size(1_000_000),
        Naming::Timestamps,
        Cleanup::KeepLogFiles(3),
      )
      .duplicate_to_stderr(Duplicate::Warn)
      .start()?,
    None => logger.log_to_stderr().start()?,
  };
  Ok(handle)
}

/// Address the follower listens on without --listen.
const DEFAULT_LISTEN: &str = "0.0.0.0:9000";

async fn open_link(cli: &Cli) -> Result<PeerLink, AppError> {
  if let Some(url) = &cli.connect {
    return Ok(transport::connect(url).await?);
  }

  let listener = WsListener::bind(cli.listen.as_deref().unwrap_or(DEFAULT_LISTEN)).await?;
  log::info!("Waiting for peer on {}", listener.local_addr()?);
  Ok(listener.accept().await?)
}

pub async fn run() -> Result<(), AppError> {
  let cli = Cli::parse();
  let _logger = init_logging(&cli)?;

  let config_path = cli.config.clone().or_else(AppConfig::default_path);
  let mut config = match &config_path {
    Some(path) => AppConfig::load(path)?,
    None => AppConfig::default(),
  };
  cli.apply(&mut config);
  config.validate()?;

  let role = cli.role();
  if role == Role::Driver && cli.video.as_deref().map_or(true, str::is_empty) {
    return Err(AppError::MissingVideo);
  }

  let mpv_path = config
    .mpv_path
    .as_ref()
    .filter(|s| !s.is_empty())
    .map(PathBuf::from);
  let client = MpvClient::new(mpv_path, config.mpv_args.clone());
  client.start().await?;

  let result = async {
    let player = Arc::new(MpvPlayer::attach(client.clone()).await?);
    let link = open_link(&cli).await?;
    let session = Session::new(player, role, config.sync_options(cli.video.clone()));

    tokio::select! {
      _ = session.run(link) => {}
      _ = tokio::signal::ctrl_c() => log::info!("Interrupted, shutting down"),
    }
    Ok::<(), AppError>(())
  }
  .await;

  client.quit().await;
  result
}
