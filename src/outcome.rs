// Terminal results of a transfer. A `TransferOutcome` is produced exactly
// once per invocation and is the only thing the reporter and the exit status
// look at.

use std::fmt;
use std::path::Path;

use crate::artifact::FileArtifact;
use crate::config::ConfigError;
use crate::validation::ValidationError;

/// Closed failure taxonomy shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Unauthorized,
    TooLarge,
    ServerFault,
    ServiceUnavailable,
    NetworkError,
    Timeout,
    IoError,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::NotFound => "not found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::TooLarge => "too large",
            ErrorKind::ServerFault => "server fault",
            ErrorKind::ServiceUnavailable => "service unavailable",
            ErrorKind::NetworkError => "network error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::IoError => "I/O error",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// A classified failure with a human readable message and, when the user
/// can do something about it, a hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
    pub hint: Option<String>,
    /// HTTP status when the failure came from a server response.
    pub status: Option<u16>,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Failure {
            kind,
            message: message.into(),
            hint: None,
            status: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ValidationError> for Failure {
    fn from(err: ValidationError) -> Self {
        let kind = match err {
            ValidationError::TooLarge { .. } => ErrorKind::TooLarge,
            _ => ErrorKind::InvalidInput,
        };
        let failure = Failure::new(kind, err.to_string());
        match err {
            ValidationError::TooLarge { .. } => failure.with_hint("Try uploading a smaller file"),
            ValidationError::NotANumber(_) | ValidationError::OutOfRange(_) => {
                failure.with_hint("Use the file code printed by `shareio post`")
            }
            _ => failure,
        }
    }
}

impl From<ConfigError> for Failure {
    fn from(err: ConfigError) -> Self {
        Failure::new(ErrorKind::InvalidInput, format!("Invalid configuration: {err}"))
            .with_hint("Check the SHAREIO_HOST and SHAREIO_PROTOCOL environment variables")
    }
}

/// What the backend handed back for an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub code: u16,
    pub artifact: FileArtifact,
    pub password_protected: bool,
}

/// Where a download ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReceipt {
    pub artifact: FileArtifact,
    /// Name suggested by the server (or the fallback).
    pub suggested_name: String,
    /// True when a collision forced a different name on disk.
    pub renamed: bool,
}

impl DownloadReceipt {
    pub fn path(&self) -> &Path {
        &self.artifact.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receipt {
    Upload(UploadReceipt),
    Download(DownloadReceipt),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Success(Receipt),
    Failure(Failure),
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Success(_))
    }

    /// Process exit status: 0 for success, 1 for any failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            TransferOutcome::Success(_) => 0,
            TransferOutcome::Failure(_) => 1,
        }
    }
}

impl From<Failure> for TransferOutcome {
    fn from(failure: Failure) -> Self {
        TransferOutcome::Failure(failure)
    }
}
