// API client module: a blocking HTTP client that talks to the ShareIO
// backend. It owns the upload and download pipelines and hands every
// failure to the classifier before returning it.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind as IoErrorKind, Read, Write};
use std::path::Path;

use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::artifact::FileArtifact;
use crate::classify::{classify, Fault};
use crate::config::{Config, HEALTH_TIMEOUT};
use crate::outcome::{DownloadReceipt, Failure, Receipt, TransferOutcome, UploadReceipt};
use crate::placement;
use crate::progress::{ProgressReader, SharedSink};
use crate::validation::validate_code;

/// Name used when the server does not suggest one.
pub const FALLBACK_FILE_NAME: &str = "downloaded_file";

const USER_AGENT: &str = concat!("shareio-cli/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one backend. Built once per process run from the
/// resolved `Config`.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    config: Config,
}

/// Body of a successful `POST /upload`. Older backends answer with `port`,
/// newer ones with `fileCode`; either may be a number or a string.
#[derive(Deserialize, Debug, Default)]
pub struct UploadResponse {
    #[serde(default)]
    pub port: Option<Value>,
    #[serde(default, rename = "fileCode")]
    pub file_code: Option<Value>,
    #[serde(default)]
    pub password: Option<Value>,
}

impl UploadResponse {
    /// The assigned file code, if present and within the valid range.
    pub fn code(&self) -> Option<u16> {
        [&self.port, &self.file_code]
            .into_iter()
            .flatten()
            .find_map(|value| match value {
                Value::Number(n) => validate_code(&n.to_string()).ok(),
                Value::String(s) => validate_code(s).ok(),
                _ => None,
            })
    }

    /// Whether the backend reports that a password was applied.
    pub fn password_applied(&self) -> bool {
        match &self.password {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::Null) | None => false,
            Some(_) => true,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiClient {
    /// Create a client for the backend described by `config`.
    pub fn new(config: &Config) -> Result<Self, Fault> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.request_timeout)
            .build()?;
        Ok(ApiClient {
            client,
            base_url: config.backend_url(),
            config: config.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe `GET /health`. Any 2xx within the short health timeout counts
    /// as available.
    pub fn check_health(&self) -> Result<(), Fault> {
        let url = format!("{}/health", self.base_url);
        debug!(%url, "probing backend health");
        let res = self
            .client
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .map_err(|e| Fault::Unhealthy(Fault::from(e).to_string()))?;
        if !res.status().is_success() {
            return Err(Fault::Unhealthy(format!(
                "health check returned HTTP {}",
                res.status().as_u16()
            )));
        }
        Ok(())
    }

    /// Upload `artifact`, protected by `password` when given. The backend
    /// is probed first; if it is down no upload request is made.
    pub fn upload(
        &self,
        artifact: &FileArtifact,
        password: Option<&str>,
        sink: SharedSink,
    ) -> TransferOutcome {
        info!(file = %artifact.name, size = artifact.size, protected = password.is_some(), "starting upload");
        let result = self.try_upload(artifact, password, &sink);
        self.finish(result.map(Receipt::Upload), &sink)
    }

    /// Download the file behind `code` into `destination`, which must be an
    /// existing writable directory.
    pub fn download(
        &self,
        code: u16,
        password: Option<&str>,
        destination: &Path,
        sink: SharedSink,
    ) -> TransferOutcome {
        info!(code, destination = %destination.display(), "starting download");
        let result = self.try_download(code, password, destination, &sink);
        self.finish(result.map(Receipt::Download), &sink)
    }

    fn finish(&self, result: Result<Receipt, Fault>, sink: &SharedSink) -> TransferOutcome {
        match result {
            Ok(receipt) => {
                sink.on_complete();
                TransferOutcome::Success(receipt)
            }
            Err(fault) => {
                debug!(?fault, "transfer failed");
                let failure: Failure = classify(fault);
                warn!(kind = %failure.kind, status = ?failure.status, "{}", failure.message);
                sink.on_failure(&failure.message);
                TransferOutcome::Failure(failure)
            }
        }
    }

    fn try_upload(
        &self,
        artifact: &FileArtifact,
        password: Option<&str>,
        sink: &SharedSink,
    ) -> Result<UploadReceipt, Fault> {
        if artifact.size > self.config.max_upload_size {
            return Err(Fault::TooLarge {
                size: artifact.size,
                limit: self.config.max_upload_size,
            });
        }

        self.check_health()?;

        let file = File::open(&artifact.path)?;
        let reader = ProgressReader::new(
            BufReader::with_capacity(self.config.chunk_size, file),
            sink.clone(),
        );
        // A known part length lets reqwest send an exact Content-Length
        // instead of chunked framing.
        let part = multipart::Part::reader_with_length(reader, artifact.size)
            .file_name(artifact.name.clone())
            .mime_str("application/octet-stream")?;
        let mut form = multipart::Form::new().part("file", part);
        if let Some(password) = password {
            form = form.text("password", password.to_string());
        }

        let url = format!("{}/upload", self.base_url);
        debug!(%url, "sending multipart upload");
        sink.on_start(Some(artifact.size));
        let res = self
            .client
            .post(&url)
            .timeout(self.config.request_timeout)
            .multipart(form)
            .send()?;

        if !res.status().is_success() {
            return Err(status_fault(res));
        }

        let body: UploadResponse = res.json()?;
        let code = body
            .code()
            .ok_or_else(|| Fault::Protocol("response did not contain a valid file code".into()))?;
        info!(code, "upload accepted");

        Ok(UploadReceipt {
            code,
            artifact: artifact.clone(),
            password_protected: password.is_some() || body.password_applied(),
        })
    }

    fn try_download(
        &self,
        code: u16,
        password: Option<&str>,
        destination: &Path,
        sink: &SharedSink,
    ) -> Result<DownloadReceipt, Fault> {
        let url = format!("{}/download/{}", self.base_url, code);
        let mut req = self.client.get(&url).timeout(self.config.download_timeout);
        if let Some(password) = password {
            req = req.query(&[("pass", password)]);
        }
        debug!(%url, with_password = password.is_some(), "requesting download");
        let mut res = req.send()?;

        if !res.status().is_success() {
            return Err(status_fault(res));
        }

        let suggested = suggested_filename(res.headers())
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
        let path = placement::resolve(destination, &suggested);
        debug!(suggested = %suggested, path = %path.display(), "download destination chosen");

        // create_new: never truncate a file that appeared after resolution.
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        sink.on_start(res.content_length());

        // Partial files are left in place on failure.
        let mut buf = vec![0u8; self.config.chunk_size];
        let mut written: u64 = 0;
        loop {
            let n = match res.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
                Err(e) => return Err(Fault::from_stream(e)),
            };
            file.write_all(&buf[..n])?;
            written += n as u64;
            sink.on_progress(written);
        }
        file.flush()?;
        drop(file);

        let artifact = FileArtifact::snapshot(&path)?;
        info!(path = %path.display(), bytes = written, "download complete");
        let renamed = artifact.name != suggested;
        Ok(DownloadReceipt {
            artifact,
            suggested_name: suggested,
            renamed,
        })
    }
}

/// Turn a non-success response into a `Fault`, keeping a short server
/// message when one is available.
fn status_fault(res: Response) -> Fault {
    let status = res.status().as_u16();
    let text = res.text().unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .or_else(|| {
            let trimmed = text.trim();
            (!trimmed.is_empty() && trimmed.len() <= 200 && !trimmed.starts_with('<'))
                .then(|| trimmed.to_string())
        });
    Fault::Status { status, message }
}

/// Find the server suggested file name. Header names are compared
/// case-insensitively by a plain scan.
pub fn suggested_filename(headers: &HeaderMap) -> Option<String> {
    let (_, value) = headers
        .iter()
        .find(|(name, _)| name.as_str().eq_ignore_ascii_case("content-disposition"))?;
    let value = String::from_utf8_lossy(value.as_bytes());
    parse_disposition(&value)
}

/// Extract `<name>` from a `filename="<name>"` parameter and reduce it to a
/// bare file name so it cannot point outside the output directory.
pub fn parse_disposition(value: &str) -> Option<String> {
    let start = value.find("filename=\"")? + "filename=\"".len();
    let rest = &value[start..];
    let end = rest.rfind('"')?;
    let raw = &rest[..end];
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    match name {
        "" | "." | ".." => None,
        _ => Some(name.to_string()),
    }
}
