// Input validation: every local precondition is checked here before any
// network activity. Each check is independent and returns a
// `ValidationResult`; callers stop at the first failure.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::artifact::{format_size, FileArtifact};

pub const MIN_CODE: u16 = 1024;
pub const MAX_CODE: u16 = 65535;
pub const MIN_PASSWORD_LEN: usize = 4;
pub const MAX_PASSWORD_LEN: usize = 50;

const MAX_PROBE_ATTEMPTS: u32 = 100;

/// Why a local precondition does not hold.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Cannot access file: {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{} is not a file", .0.display())]
    NotAFile(PathBuf),

    #[error("Cannot access file {}: {reason}", .path.display())]
    Inaccessible { path: PathBuf, reason: String },

    #[error("File size ({}) exceeds maximum allowed size ({})", size_label(.size), size_label(.limit))]
    TooLarge { size: u64, limit: u64 },

    #[error("File code must be a valid number, got '{0}'")]
    NotANumber(String),

    #[error("File code must be between {} and {}, got '{}'", MIN_CODE, MAX_CODE, .0)]
    OutOfRange(String),

    #[error("Password must be at least {} characters long", MIN_PASSWORD_LEN)]
    TooShort,

    #[error("Password must be at most {} characters long", MAX_PASSWORD_LEN)]
    TooLong,

    #[error("Output directory {} is not accessible: {reason}", .path.display())]
    NotWritable { path: PathBuf, reason: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check that `path` is a readable regular file no larger than `max_size`
/// and take a snapshot of it.
pub fn validate_local_file(path: &Path, max_size: u64) -> ValidationResult<FileArtifact> {
    let resolved = absolute(path);
    let meta = match fs::metadata(&resolved) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ValidationError::NotFound(resolved));
        }
        Err(e) => {
            return Err(ValidationError::Inaccessible {
                path: resolved,
                reason: e.to_string(),
            });
        }
    };
    if !meta.is_file() {
        return Err(ValidationError::NotAFile(resolved));
    }
    if meta.len() > max_size {
        return Err(ValidationError::TooLarge {
            size: meta.len(),
            limit: max_size,
        });
    }
    debug!(path = %resolved.display(), size = meta.len(), "local file accepted");
    Ok(FileArtifact::from_metadata(resolved, &meta))
}

/// Parse a file code: a base-10 integer in `[MIN_CODE, MAX_CODE]`.
pub fn validate_code(raw: &str) -> ValidationResult<u16> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::NotANumber(raw.to_string()));
    }
    // Digit strings too long for i64 are out of range, not malformed.
    match trimmed.parse::<i64>() {
        Ok(n) if (i64::from(MIN_CODE)..=i64::from(MAX_CODE)).contains(&n) => Ok(n as u16),
        _ => Err(ValidationError::OutOfRange(raw.to_string())),
    }
}

/// An absent or empty password means "no protection". Length is counted in
/// characters.
pub fn validate_password(raw: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(password) = raw.filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort);
    }
    if len > MAX_PASSWORD_LEN {
        return Err(ValidationError::TooLong);
    }
    Ok(Some(password.to_string()))
}

/// Resolve `path` to an absolute directory, creating it (and missing
/// ancestors) when needed, and prove it is writable.
pub fn validate_output_directory(path: &Path) -> ValidationResult<PathBuf> {
    let resolved = absolute(path);
    let not_writable = |reason: String| ValidationError::NotWritable {
        path: resolved.clone(),
        reason,
    };

    if !resolved.exists() {
        debug!(path = %resolved.display(), "creating output directory");
        fs::create_dir_all(&resolved).map_err(|e| not_writable(e.to_string()))?;
    }
    if !resolved.is_dir() {
        return Err(not_writable("not a directory".into()));
    }

    let probe = write_probe(&resolved).map_err(|e| not_writable(e.to_string()))?;
    let _ = fs::remove_file(&probe);

    Ok(resolved)
}

/// Create a fresh marker file in `dir`. Leftovers from earlier runs are
/// skipped, never reused.
fn write_probe(dir: &Path) -> std::io::Result<PathBuf> {
    let base = format!(".shareio-write-probe-{}", std::process::id());
    let mut attempt = 0u32;
    loop {
        let probe = if attempt == 0 {
            dir.join(&base)
        } else {
            dir.join(format!("{base}.{attempt}"))
        };
        match OpenOptions::new().write(true).create_new(true).open(&probe) {
            Ok(_) => return Ok(probe),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < MAX_PROBE_ATTEMPTS => {
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn size_label(bytes: &u64) -> String {
    format_size(*bytes)
}

/// Anchor `path` at the working directory and drop `.` components, so `.`
/// shows up as the directory itself rather than `/cwd/.`.
fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
