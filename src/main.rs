use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use blob_download_lib::settings::{Settings, DEFAULT_ENVIRONMENT};

/// Download the blobs modified in the last 24 hours, then exit
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Directory holding appsettings.json
    #[arg(long, default_value = ".")]
    content_root: PathBuf,

    /// Selects the appsettings.{environment}.json overlay
    #[arg(long, env = "BLOB_DOWNLOAD_ENVIRONMENT", default_value = DEFAULT_ENVIRONMENT)]
    environment: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let settings = match Settings::load(&cli.content_root, &cli.environment) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match blob_download_lib::run_host(&settings).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
