//! Paged blob listing

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, Stream};
use reqwest::{Method, StatusCode};

use crate::client::ContainerClient;
use crate::error::{StorageError, StorageResult};
use crate::types::{BlobItem, ListBlobsPage};

/// Largest page the service will return
const MAX_RESULTS: u32 = 5000;

impl ContainerClient {
    /// Fetch one page of the flat listing, starting at `marker`. A missing
    /// container is reported as `ContainerNotFound`.
    pub async fn list_blobs_page(&self, marker: Option<&str>) -> StorageResult<ListBlobsPage> {
        let mut query = vec![
            ("restype", "container".to_string()),
            ("comp", "list".to_string()),
            ("maxresults", MAX_RESULTS.to_string()),
        ];
        if let Some(marker) = marker {
            query.push(("marker", marker.to_string()));
        }

        let (url, request) = self
            .service
            .request(Method::GET, &self.container_path(), &query);

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::request(&url, e))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(StorageError::ContainerNotFound(self.name.clone()));
            }
            _ => return Err(StorageError::from_response(&response)),
        }

        let body = response
            .text()
            .await
            .map_err(|e| StorageError::request(&url, e))?;

        parse_list_blobs(&body)
    }

    /// Every blob in the container, fetched page by page as the stream is
    /// polled. The stream is finite and cannot be restarted; call again for a
    /// fresh enumeration.
    pub fn list_blobs(&self) -> impl Stream<Item = StorageResult<BlobItem>> + '_ {
        self.listing(ListState::default())
    }

    /// Continue a listing whose first page was fetched with
    /// [`ContainerClient::list_blobs_page`]: yields that page's blobs, then
    /// the following pages.
    pub fn list_blobs_after(
        &self,
        first: ListBlobsPage,
    ) -> impl Stream<Item = StorageResult<BlobItem>> + '_ {
        self.listing(ListState {
            pending: first.blobs.into(),
            exhausted: first.next_marker.is_none(),
            marker: first.next_marker,
            pages: 1,
        })
    }

    fn listing(&self, state: ListState) -> impl Stream<Item = StorageResult<BlobItem>> + '_ {
        stream::try_unfold(state, move |mut state| async move {
            loop {
                if let Some(blob) = state.pending.pop_front() {
                    return Ok::<_, StorageError>(Some((blob, state)));
                }
                if state.exhausted {
                    return Ok(None);
                }

                let page = self.list_blobs_page(state.marker.as_deref()).await?;
                state.pages += 1;
                log::debug!(
                    "Listed page {} of '{}' ({} blobs)",
                    state.pages,
                    self.name,
                    page.blobs.len()
                );
                state.exhausted = page.next_marker.is_none();
                state.marker = page.next_marker;
                state.pending.extend(page.blobs);
            }
        })
    }
}

#[derive(Default)]
struct ListState {
    pending: VecDeque<BlobItem>,
    marker: Option<String>,
    exhausted: bool,
    pages: usize,
}

/// Parse an `EnumerationResults` document
pub(crate) fn parse_list_blobs(xml: &str) -> StorageResult<ListBlobsPage> {
    if !xml.contains("<EnumerationResults") {
        return Err(StorageError::MalformedResponse(
            "listing response has no EnumerationResults element".to_string(),
        ));
    }

    let blobs = xml
        .split("<Blob>")
        .skip(1)
        .map(|chunk| chunk.split("</Blob>").next().unwrap_or(chunk))
        .map(parse_blob)
        .collect::<StorageResult<Vec<_>>>()?;

    let next_marker = element_text(xml, "NextMarker")
        .map(unescape)
        .filter(|m| !m.is_empty());

    Ok(ListBlobsPage { blobs, next_marker })
}

fn parse_blob(xml: &str) -> StorageResult<BlobItem> {
    let (name_attrs, raw_name) = element(xml, "Name")
        .ok_or_else(|| StorageError::MalformedResponse("blob entry without a Name".to_string()))?;
    let mut name = unescape(raw_name);
    // Names with characters XML cannot carry are sent percent-encoded
    if name_attrs.contains("Encoded=\"true\"") {
        name = urlencoding::decode(&name)
            .map_err(|e| StorageError::MalformedResponse(format!("undecodable blob name: {}", e)))?
            .into_owned();
    }

    let last_modified = element_text(xml, "Last-Modified")
        .ok_or_else(|| {
            StorageError::MalformedResponse(format!("blob '{}' has no Last-Modified", name))
        })
        .and_then(|raw| {
            DateTime::parse_from_rfc2822(raw.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    StorageError::MalformedResponse(format!(
                        "blob '{}' has invalid Last-Modified '{}': {}",
                        name, raw, e
                    ))
                })
        })?;

    let content_length = element_text(xml, "Content-Length").and_then(|v| v.trim().parse().ok());

    Ok(BlobItem {
        name,
        last_modified,
        content_length,
    })
}

/// Attributes and text of the first `<tag ...>text</tag>` element
fn element<'a>(xml: &'a str, tag: &str) -> Option<(&'a str, &'a str)> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    let mut rest = xml;
    loop {
        let start = rest.find(&open)?;
        let after = &rest[start + open.len()..];
        // Reject prefix matches such as <NameX>
        match after.chars().next() {
            Some('>') | Some(' ') => {}
            _ => {
                rest = after;
                continue;
            }
        }
        let tag_end = after.find('>')?;
        let attrs = &after[..tag_end];
        if attrs.ends_with('/') {
            return Some((attrs, ""));
        }
        let body = &after[tag_end + 1..];
        let text = &body[..body.find(&close)?];
        return Some((attrs, text));
    }
}

fn element_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    element(xml, tag).map(|(_, text)| text)
}

fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
