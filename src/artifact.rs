// File artifacts: a read-only snapshot of a file that is known to exist on
// disk, either the source of an upload or the destination of a download.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArtifact {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Final path component, used for display and as the multipart file name.
    pub name: String,
    pub size: u64,
    /// Extension including the leading dot (`.pdf`), empty when there is none.
    pub extension: String,
    pub modified: SystemTime,
}

impl FileArtifact {
    /// Snapshot `path` using already fetched metadata.
    pub fn from_metadata(path: PathBuf, meta: &Metadata) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = extension_of(&name);
        FileArtifact {
            path,
            name,
            size: meta.len(),
            extension,
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    /// Re-read metadata for `path`. Used after a download has been written.
    pub fn snapshot(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self::from_metadata(path.to_path_buf(), &meta))
    }

    pub fn formatted_size(&self) -> String {
        format_size(self.size)
    }

    /// Upper-cased extension without the dot, e.g. `PDF`.
    pub fn kind(&self) -> Option<String> {
        self.extension
            .strip_prefix('.')
            .filter(|e| !e.is_empty())
            .map(|e| e.to_uppercase())
    }

    pub fn modified_local(&self) -> String {
        let time: DateTime<Local> = self.modified.into();
        time.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Split a file name into stem and extension the way most shells display
/// them: a leading dot is part of the stem (`.bashrc` has no extension).
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(idx) => name.split_at(idx),
    }
}

fn extension_of(name: &str) -> String {
    split_name(name).1.to_string()
}

/// Human readable size with two decimals and a 1024 base.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}
