// Command pipelines: validate, transfer, report. Each returns the finished
// `Report`; the binary renders it and picks the exit status from it.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::api::ApiClient;
use crate::artifact::FileArtifact;
use crate::classify::classify;
use crate::config::Config;
use crate::outcome::Failure;
use crate::report::{download_summary, file_summary, report, Operation, Report};
use crate::ui::Terminal;
use crate::validation::{
    validate_code, validate_local_file, validate_output_directory, validate_password,
};

/// Everything an upload needs once local checks have passed.
pub struct UploadPlan {
    pub client: ApiClient,
    pub artifact: FileArtifact,
    pub password: Option<String>,
}

/// Everything a download needs once local checks have passed.
pub struct DownloadPlan {
    pub client: ApiClient,
    pub code: u16,
    pub password: Option<String>,
    pub destination: PathBuf,
}

/// Run all upload preconditions, stopping at the first failure.
pub fn plan_upload(config: &Config, file: &Path, password: Option<&str>) -> Result<UploadPlan, Failure> {
    config.validate()?;
    let artifact = validate_local_file(file, config.max_upload_size)?;
    let password = validate_password(password)?;
    let client = ApiClient::new(config).map_err(classify)?;
    Ok(UploadPlan {
        client,
        artifact,
        password,
    })
}

/// Run all download preconditions, stopping at the first failure.
pub fn plan_download(
    config: &Config,
    code: &str,
    password: Option<&str>,
    output: Option<&Path>,
) -> Result<DownloadPlan, Failure> {
    config.validate()?;
    let code = validate_code(code)?;
    let password = validate_password(password)?;
    let destination = validate_output_directory(output.unwrap_or(Path::new(".")))?;
    let client = ApiClient::new(config).map_err(classify)?;
    Ok(DownloadPlan {
        client,
        code,
        password,
        destination,
    })
}

/// `shareio post <file> [--pass <password>]`
pub fn post(config: &Config, term: &Terminal, file: &Path, password: Option<&str>) -> Result<Report> {
    term.banner("ShareIO - File Upload")?;

    let plan = match plan_upload(config, file, password) {
        Ok(plan) => plan,
        Err(failure) => {
            debug!(kind = %failure.kind, "upload rejected before any network call");
            return Ok(report(Operation::Upload, failure.into()));
        }
    };

    term.details("File Information:", &file_summary(&plan.artifact))?;
    term.info(&format!("Contacting backend service at {}...", plan.client.base_url()))?;
    if plan.password.is_some() {
        term.info("File will be uploaded with password protection")?;
    } else {
        term.info("File will be uploaded without password protection")?;
    }

    let sink = term.progress(&format!("Uploading {}", plan.artifact.name));
    let outcome = plan
        .client
        .upload(&plan.artifact, plan.password.as_deref(), sink);
    Ok(report(Operation::Upload, outcome))
}

/// `shareio get <code> [--pass <password>] [--output <dir>]`
pub fn get(
    config: &Config,
    term: &Terminal,
    code: &str,
    password: Option<&str>,
    output: Option<&Path>,
) -> Result<Report> {
    term.banner("ShareIO - File Download")?;

    let plan = match plan_download(config, code, password, output) {
        Ok(plan) => plan,
        Err(failure) => {
            debug!(kind = %failure.kind, "download rejected before any network call");
            return Ok(report(Operation::Download, failure.into()));
        }
    };

    term.details(
        "Download Information:",
        &download_summary(plan.code, &plan.destination, plan.password.as_deref()),
    )?;

    let sink = term.progress("Downloading file");
    let outcome = plan.client.download(
        plan.code,
        plan.password.as_deref(),
        &plan.destination,
        sink,
    );
    Ok(report(Operation::Download, outcome))
}
