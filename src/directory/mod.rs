//! Directory-level orchestration layer built on top of the core delta engine: an
//! in-memory representation of a directory tree, its compressed serialization, and
//! a cross-version add/remove/update patch format.

mod model;
mod package;
mod patch;

pub use model::{DirectoryModel, VirtualFile};
pub use package::{pack_directory, unpack_directory};
pub use patch::{apply_directory_patch, diff_directories, DirectoryPatcher};

use crate::{Error, Result};

/// Validate a relative path: non-empty, `/`-separated, no `..` segments.
pub(crate) fn validate_relative_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::BadPath {
            path: path.to_string(),
            reason: "path is empty",
        });
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(Error::BadPath {
            path: path.to_string(),
            reason: "path contains a `..` segment",
        });
    }
    Ok(())
}
