// Error classification: turns transport and HTTP level faults into the
// user facing failure taxonomy. No raw transport error reaches the user
// without passing through `classify`.

use std::error::Error as StdError;
use std::io;

use crate::artifact::format_size;
use crate::outcome::{ErrorKind, Failure};

const HINT_SERVICE: &str = "Make sure the ShareIO backend service is running";
const HINT_NETWORK: &str =
    "Check your internet connection and make sure the backend service is running";

/// Low level reason a request did not produce a usable result.
#[derive(Debug, thiserror::Error)]
pub enum Fault {
    /// The server answered with a non-success status.
    #[error("server responded with HTTP {status}")]
    Status { status: u16, message: Option<String> },

    /// Nothing was listening at the backend address.
    #[error("connection refused: {0}")]
    Refused(String),

    /// The request went out (or tried to) but no response came back.
    #[error("no response from server: {0}")]
    Unreachable(String),

    #[error("timed out: {0}")]
    TimedOut(String),

    /// The request could not be constructed at all.
    #[error("could not build request: {0}")]
    Request(String),

    /// Local read or write failure while streaming.
    #[error("local I/O failure: {0}")]
    Io(#[from] io::Error),

    /// Success status with a body we could not understand.
    #[error("unexpected response: {0}")]
    Protocol(String),

    /// The liveness probe did not come back healthy.
    #[error("service unavailable: {0}")]
    Unhealthy(String),

    /// Rejected before sending because of the client-side size ceiling.
    #[error("{size} bytes exceeds the {limit} byte upload limit")]
    TooLarge { size: u64, limit: u64 },
}

impl From<reqwest::Error> for Fault {
    fn from(err: reqwest::Error) -> Self {
        let detail = describe(&err);
        if err.is_timeout() {
            return Fault::TimedOut(detail);
        }
        if err.is_builder() {
            return Fault::Request(detail);
        }
        if let Some(status) = err.status() {
            return Fault::Status {
                status: status.as_u16(),
                message: None,
            };
        }
        if err.is_connect() {
            return match find_io_kind(&err) {
                Some(io::ErrorKind::ConnectionRefused) => Fault::Refused(detail),
                Some(io::ErrorKind::TimedOut) => Fault::TimedOut(detail),
                _ => Fault::Unreachable(detail),
            };
        }
        if err.is_decode() {
            return Fault::Protocol(detail);
        }
        if find_io_kind(&err) == Some(io::ErrorKind::TimedOut) {
            return Fault::TimedOut(detail);
        }
        Fault::Unreachable(detail)
    }
}

impl Fault {
    /// Classify an error raised while reading an already started response
    /// body. Body reads surface as `io::Error`, possibly wrapping a
    /// `reqwest::Error`.
    pub fn from_stream(err: io::Error) -> Self {
        let detail = describe(&err);
        if err.kind() == io::ErrorKind::TimedOut
            || find_io_kind(&err) == Some(io::ErrorKind::TimedOut)
            || find_reqwest(&err).is_some_and(|e| e.is_timeout())
        {
            return Fault::TimedOut(detail);
        }
        Fault::Unreachable(detail)
    }
}

/// Map a fault to exactly one `ErrorKind` with a message and, where the
/// user can act on it, a hint.
pub fn classify(fault: Fault) -> Failure {
    match fault {
        Fault::Status { status, message } => classify_status(status, message),
        Fault::Refused(detail) => Failure::new(
            ErrorKind::ServiceUnavailable,
            format!("Cannot connect to the server ({detail})"),
        )
        .with_hint(HINT_SERVICE),
        Fault::Unreachable(detail) => Failure::new(
            ErrorKind::NetworkError,
            format!("Network error - cannot reach the server ({detail})"),
        )
        .with_hint(HINT_NETWORK),
        Fault::TimedOut(detail) => {
            Failure::new(ErrorKind::Timeout, format!("Request timed out ({detail})")).with_hint(
                "The server may be busy; try again or raise SHAREIO_TIMEOUT / DOWNLOAD_TIMEOUT",
            )
        }
        Fault::Request(detail) => Failure::new(
            ErrorKind::InvalidInput,
            format!("Could not build the request: {detail}"),
        )
        .with_hint("Check the SHAREIO_HOST, SHAREIO_PORT and SHAREIO_PROTOCOL settings"),
        Fault::Io(err) => Failure::new(ErrorKind::IoError, format!("Local file error: {err}"))
            .with_hint("Check free disk space and file permissions"),
        Fault::Protocol(detail) => Failure::new(
            ErrorKind::ServerFault,
            format!("Unexpected response from server: {detail}"),
        ),
        Fault::Unhealthy(detail) => Failure::new(
            ErrorKind::ServiceUnavailable,
            format!("Service unavailable: {detail}"),
        )
        .with_hint(HINT_SERVICE),
        Fault::TooLarge { size, limit } => Failure::new(
            ErrorKind::TooLarge,
            format!(
                "File size ({}) exceeds maximum allowed size ({})",
                format_size(size),
                format_size(limit)
            ),
        )
        .with_hint("Try uploading a smaller file"),
    }
}

fn classify_status(status: u16, message: Option<String>) -> Failure {
    let failure = match status {
        400 => Failure::new(
            ErrorKind::InvalidInput,
            message.unwrap_or_else(|| "Bad request - check your parameters".into()),
        ),
        401 => Failure::new(ErrorKind::Unauthorized, "Unauthorized - check your password")
            .with_hint("Pass the password the file was shared with using --pass"),
        404 => Failure::new(ErrorKind::NotFound, "File not found - check your file code")
            .with_hint("Make sure the file code is correct and the file is still available"),
        413 => Failure::new(ErrorKind::TooLarge, "File too large")
            .with_hint("Try uploading a smaller file"),
        500..=599 => Failure::new(ErrorKind::ServerFault, "Server error")
            .with_hint("Try again later or contact support"),
        _ => Failure::new(
            ErrorKind::Unknown,
            message.unwrap_or_else(|| format!("HTTP {status}: unexpected response")),
        ),
    };
    failure.with_status(status)
}

/// Error text including its sources, e.g. `error sending request: connection refused`.
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

fn find_io_kind(err: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if io_err.kind() != io::ErrorKind::Other {
                return Some(io_err.kind());
            }
        }
        current = e.source();
    }
    None
}

fn find_reqwest<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a reqwest::Error> {
    let mut current: Option<&'a (dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(found) = e.downcast_ref::<reqwest::Error>() {
            return Some(found);
        }
        // io::Error hides its payload from `source()`; look inside explicitly.
        if let Some(inner) = e.downcast_ref::<io::Error>().and_then(|io_err| io_err.get_ref()) {
            if let Some(found) = inner.downcast_ref::<reqwest::Error>() {
                return Some(found);
            }
        }
        current = e.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> Fault {
        Fault::Status {
            status: code,
            message: None,
        }
    }

    #[test]
    fn statuses_map_to_expected_kinds() {
        let cases = [
            (400, ErrorKind::InvalidInput),
            (401, ErrorKind::Unauthorized),
            (404, ErrorKind::NotFound),
            (413, ErrorKind::TooLarge),
            (500, ErrorKind::ServerFault),
            (503, ErrorKind::ServerFault),
        ];
        for (code, kind) in cases {
            let failure = classify(status(code));
            assert_eq!(failure.kind, kind, "status {code}");
            assert_eq!(failure.status, Some(code));
            assert!(!failure.message.is_empty());
        }
    }

    #[test]
    fn transport_faults_are_never_unknown() {
        let faults = [
            (Fault::Refused("refused".into()), ErrorKind::ServiceUnavailable),
            (Fault::Unreachable("dns error".into()), ErrorKind::NetworkError),
            (Fault::TimedOut("deadline".into()), ErrorKind::Timeout),
            (Fault::Unhealthy("down".into()), ErrorKind::ServiceUnavailable),
            (Fault::Request("bad url".into()), ErrorKind::InvalidInput),
            (Fault::Io(io::Error::other("disk full")), ErrorKind::IoError),
        ];
        for (fault, kind) in faults {
            assert_eq!(classify(fault).kind, kind);
        }
    }

    #[test]
    fn bad_request_prefers_server_message() {
        let failure = classify(Fault::Status {
            status: 400,
            message: Some("missing file field".into()),
        });
        assert_eq!(failure.message, "missing file field");
    }

    #[test]
    fn unexpected_status_is_unknown() {
        let failure = classify(status(418));
        assert_eq!(failure.kind, ErrorKind::Unknown);
        assert!(failure.message.contains("418"));
    }

    #[test]
    fn unreachable_and_refused_carry_hints() {
        assert!(classify(Fault::Refused("x".into())).hint.is_some());
        assert!(classify(Fault::Unreachable("x".into())).hint.is_some());
        assert!(classify(Fault::Unhealthy("x".into())).hint.is_some());
    }

    #[test]
    fn stream_timeouts_are_detected() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "read timed out");
        assert!(matches!(Fault::from_stream(err), Fault::TimedOut(_)));

        let err = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(Fault::from_stream(err), Fault::Unreachable(_)));
    }
}
