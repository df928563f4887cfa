use chrono::{DateTime, Duration, Utc};

/// Blobs modified less than this many hours ago are downloaded
pub const RECENCY_WINDOW_HOURS: i64 = 24;

/// Strictly inside the window: an age of exactly 24h is excluded. Timestamps
/// in the future count as recent.
pub fn is_recent(last_modified: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(last_modified) < Duration::hours(RECENCY_WINDOW_HOURS)
}
