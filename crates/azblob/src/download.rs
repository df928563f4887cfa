//! Streamed blob download

use futures_util::StreamExt;
use reqwest::Method;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::client::ContainerClient;
use crate::error::{StorageError, StorageResult};

/// Write buffer size for downloads (2 MB) - reduces I/O operations
const WRITE_BUFFER_SIZE: usize = 2 * 1024 * 1024;

impl ContainerClient {
    /// Copy the full content of `blob_name` into `writer`, returning the number
    /// of bytes written. Nothing already written is rolled back on failure.
    pub async fn download_to<W>(&self, blob_name: &str, writer: &mut W) -> StorageResult<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let (url, request) = self
            .service
            .request(Method::GET, &self.blob_path(blob_name), &[]);

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::request(&url, e))?;

        if !response.status().is_success() {
            return Err(StorageError::from_response(&response));
        }

        let expected = response.content_length();
        let mut stream = response.bytes_stream();
        let mut write_buffer = Vec::with_capacity(WRITE_BUFFER_SIZE);
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StorageError::request(&url, e))?;
            write_buffer.extend_from_slice(&chunk);

            if write_buffer.len() >= WRITE_BUFFER_SIZE {
                writer.write_all(&write_buffer).await?;
                written += write_buffer.len() as u64;
                write_buffer.clear();
            }
        }

        if !write_buffer.is_empty() {
            writer.write_all(&write_buffer).await?;
            written += write_buffer.len() as u64;
        }
        writer.flush().await?;

        if let Some(expected) = expected {
            if expected != written {
                log::warn!(
                    "Blob '{}' announced {} bytes but {} were received",
                    blob_name,
                    expected,
                    written
                );
            }
        }

        Ok(written)
    }
}
