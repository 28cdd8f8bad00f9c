//! Export of extraction results to files
//!
//! This module handles:
//! - Writing results as pretty-printed JSON
//! - Building and writing sitemap XML documents

mod json;
mod sitemap;

pub use json::{default_json_filename, write_json};
pub use sitemap::{build_sitemap, write_sitemap, DEFAULT_SITEMAP_FILE, SITEMAP_NAMESPACE};

use std::path::{Path, PathBuf};

/// Appends `extension` to `path` when the file name has none
pub fn with_default_extension(path: &Path, extension: &str) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(extension)
    }
}

/// Creates the parent directory of `path` if it does not exist yet
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
