use azblob::{BlobItem, BlobServiceClient, ConnectionString, ContainerClient};
use chrono::{DateTime, Utc};
use futures_util::{future, TryStreamExt};
use std::path::Path;
use tokio::fs::File;

use super::filter::is_recent;
use super::target::local_target;
use crate::error::{RunError, RunResult};
use crate::settings::Settings;

/// Outcome of a completed pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Blobs that passed the recency filter
    pub matched: usize,
    pub bytes_written: u64,
}

/// Run one pass against the current time
pub async fn run_download_pass(settings: &Settings) -> RunResult<PassReport> {
    run_download_pass_at(settings, Utc::now()).await
}

/// List the container, keep blobs modified within the window before `now`,
/// and download them in listing order. The first failure ends the pass;
/// files already written are left in place.
pub async fn run_download_pass_at(
    settings: &Settings,
    now: DateTime<Utc>,
) -> RunResult<PassReport> {
    let connection = ConnectionString::parse(&settings.storage_account_connection)
        .map_err(RunError::Connection)?;
    let service = BlobServiceClient::new(connection).map_err(RunError::Connection)?;
    let container = service.container(&settings.blob_container);

    log::info!(
        "Listing container '{}' on account '{}'",
        container.name(),
        service.account_name()
    );

    // The first page is the connection check: a missing container or a
    // rejected credential shows up here.
    let first_page = container
        .list_blobs_page(None)
        .await
        .map_err(RunError::Connection)?;

    let recent: Vec<BlobItem> = container
        .list_blobs_after(first_page)
        .try_filter(|blob| future::ready(is_recent(blob.last_modified, now)))
        .try_collect()
        .await
        .map_err(RunError::Listing)?;

    println!("{} files found", recent.len());

    let mut report = PassReport {
        matched: recent.len(),
        bytes_written: 0,
    };

    for blob in &recent {
        report.bytes_written +=
            download_blob(&container, blob, &settings.local_files_destination).await?;
    }

    log::info!(
        "Downloaded {} blob(s), {} bytes, into {}",
        report.matched,
        report.bytes_written,
        settings.local_files_destination.display()
    );

    Ok(report)
}

async fn download_blob(
    container: &ContainerClient,
    blob: &BlobItem,
    destination_root: &Path,
) -> RunResult<u64> {
    let target = local_target(destination_root, &blob.name)?;

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| RunError::Filesystem {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let mut file = File::create(&target)
        .await
        .map_err(|source| RunError::Filesystem {
            path: target.clone(),
            source,
        })?;

    let written = container
        .download_to(&blob.name, &mut file)
        .await
        .map_err(|source| RunError::Download {
            name: blob.name.clone(),
            source,
        })?;

    log::info!("Downloaded '{}' to {} ({} bytes)", blob.name, target.display(), written);
    Ok(written)
}
