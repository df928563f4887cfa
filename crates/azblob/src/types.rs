//! Listing types

use chrono::{DateTime, Utc};

/// A blob as reported by a container listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobItem {
    pub name: String,
    pub last_modified: DateTime<Utc>,
    pub content_length: Option<u64>,
}

/// One page of a container listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBlobsPage {
    pub blobs: Vec<BlobItem>,
    /// Marker for the next page; `None` once the listing is exhausted
    pub next_marker: Option<String>,
}
