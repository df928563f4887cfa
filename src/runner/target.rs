use std::path::{Path, PathBuf};

use crate::error::{RunError, RunResult};

/// Appended to blob names that have no extension
pub const DEFAULT_EXTENSION: &str = "pdf";

/// Whether the last `/` segment of `name` carries an extension: a `.` that is
/// not the final character. `.profile` has one, `file.` and `dir/` do not.
pub fn has_extension(name: &str) -> bool {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    match file_name.rfind('.') {
        Some(idx) => idx + 1 < file_name.len(),
        None => false,
    }
}

/// Local path for blob `name` under `root`, with `.pdf` appended when the name
/// has no extension. Names that would leave `root` are rejected.
pub fn local_target(root: &Path, name: &str) -> RunResult<PathBuf> {
    let name = if has_extension(name) {
        name.to_string()
    } else {
        format!("{}.{}", name, DEFAULT_EXTENSION)
    };

    let mut relative = PathBuf::new();
    for segment in name.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(RunError::InvalidBlobName { name: name.clone() }),
            segment => relative.push(segment),
        }
    }

    Ok(root.join(relative))
}
