//! Locating input images.
//!
//! Batch runs process every decodable image of a directory in name order,
//! or every match of a glob pattern.

use crate::detect::Format;
use crate::{IoError, IoResult};
use std::path::{Path, PathBuf};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Lists the image files directly inside `dir`, sorted by file name.
///
/// Sub-directories and files without a decodable extension are skipped.
pub fn list_images<P: AsRef<Path>>(dir: P) -> IoResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    trace!(dir = %dir.display(), "list_images");

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && Format::is_image_path(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    debug!(count = files.len(), dir = %dir.display(), "listed images");
    Ok(files)
}

/// Expands a glob pattern to image files, sorted by path.
pub fn glob_images(pattern: &str) -> IoResult<Vec<PathBuf>> {
    trace!(pattern, "glob_images");
    let paths = glob::glob(pattern).map_err(|e| IoError::Parse(e.to_string()))?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| IoError::Io(e.into()))?;
        if path.is_file() && Format::is_image_path(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
