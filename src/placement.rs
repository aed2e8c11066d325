// Placement: pick a destination path that never clobbers an existing file.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::artifact::split_name;

/// Return `directory/desired` if it is free, otherwise the first free
/// `directory/stem (N)ext` for N = 1, 2, ...
///
/// Only existence checks are made; nothing is created. Two processes racing
/// on the same name can still pick the same path.
pub fn resolve(directory: &Path, desired: &str) -> PathBuf {
    let candidate = directory.join(desired);
    if !exists(&candidate) {
        return candidate;
    }

    let (stem, ext) = split_name(desired);
    let mut counter: u64 = 1;
    loop {
        let candidate = directory.join(format!("{stem} ({counter}){ext}"));
        if !exists(&candidate) {
            debug!(desired, chosen = %candidate.display(), "renamed to avoid collision");
            return candidate;
        }
        counter += 1;
    }
}

// Dangling symlinks still occupy the name.
fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
