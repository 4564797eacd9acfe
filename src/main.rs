use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
  match mpvsync::run().await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      log::error!("{}", e);
      eprintln!("mpvsync: {}", e);
      ExitCode::FAILURE
    }
  }
}
