//! azblob - minimal Azure Blob Storage client
//!
//! This crate is organized into modules:
//! - `connection`: Connection string parsing and credentials
//! - `auth`: Shared Key request signing
//! - `client`: Service and container handles, signed request builder
//! - `list`: Paged blob listing
//! - `download`: Streamed blob download
//! - `types`: Listing types
//! - `error`: Error type

mod auth;
mod client;
mod connection;
mod download;
mod error;
mod list;
mod types;

pub use client::{BlobServiceClient, ContainerClient, API_VERSION};
pub use connection::{ConnectionString, Credential, DEV_STORAGE_ACCOUNT};
pub use error::{StorageError, StorageResult};
pub use types::{BlobItem, ListBlobsPage};
