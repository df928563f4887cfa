//! Downloads the blobs of a storage container modified in the last 24 hours.
//!
//! The binary loads [`settings::Settings`], then [`run_host`] performs exactly
//! one [`runner::run_download_pass`] wrapped in the host lifecycle.

pub mod error;
pub mod lifecycle;
pub mod runner;
pub mod settings;

pub use error::{RunError, RunResult};
pub use runner::PassReport;
pub use settings::Settings;

use lifecycle::{HostState, Lifecycle};

/// Start the host, run a single pass, and stop. The host always reaches
/// `Stopped`; the pass result is returned unchanged.
pub async fn run_host(settings: &Settings) -> RunResult<PassReport> {
    let mut lifecycle = Lifecycle::new();
    lifecycle.transition(HostState::Starting);
    log::debug!("Running with {:?}", settings);
    lifecycle.transition(HostState::Started);

    let result = runner::run_download_pass(settings).await;
    if let Err(e) = &result {
        log::error!("Download pass failed: {}", e);
    }

    lifecycle.transition(HostState::Stopping);
    lifecycle.transition(HostState::Stopped);
    result
}
