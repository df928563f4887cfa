//! Download runner - one list, filter and download pass over a container
//!
//! - `filter`: Recency window
//! - `target`: Local path derivation
//! - `pass`: The pass itself

mod filter;
mod pass;
mod target;

pub use filter::{is_recent, RECENCY_WINDOW_HOURS};
pub use pass::{run_download_pass, run_download_pass_at, PassReport};
pub use target::{has_extension, local_target, DEFAULT_EXTENSION};
