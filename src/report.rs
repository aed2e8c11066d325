// Result reporting: turns a finished `TransferOutcome` into a plain `Report`
// that the terminal layer renders. Nothing in here writes to the terminal.

use std::path::Path;

use crate::artifact::FileArtifact;
use crate::outcome::{Receipt, TransferOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Download,
}

impl Operation {
    fn failed_prefix(self) -> &'static str {
        match self {
            Operation::Upload => "Upload failed",
            Operation::Download => "Download failed",
        }
    }
}

/// Structured, render-ready result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub success: bool,
    pub headline: String,
    /// Label/value pairs, e.g. ("File Code", "8081").
    pub details: Vec<(String, String)>,
    /// Free-form follow-up lines such as commands to run next.
    pub notes: Vec<String>,
    pub hint: Option<String>,
    pub exit_code: i32,
}

/// Build the final report. Consumes the outcome.
pub fn report(operation: Operation, outcome: TransferOutcome) -> Report {
    let exit_code = outcome.exit_code();
    match outcome {
        TransferOutcome::Success(Receipt::Upload(receipt)) => {
            let mut notes = vec![
                "To download this file, use:".to_string(),
                format!("  shareio get {}", receipt.code),
            ];
            if receipt.password_protected {
                notes.push(format!("  shareio get {} --pass YOUR_PASSWORD", receipt.code));
            }
            notes.push("Keep the file code safe - you'll need it to download the file!".into());
            Report {
                success: true,
                headline: "Upload Successful!".into(),
                details: vec![
                    ("File".into(), receipt.artifact.name.clone()),
                    ("Size".into(), receipt.artifact.formatted_size()),
                    ("File Code".into(), receipt.code.to_string()),
                ],
                notes,
                hint: None,
                exit_code,
            }
        }
        TransferOutcome::Success(Receipt::Download(receipt)) => {
            let mut notes = Vec::new();
            if receipt.renamed {
                notes.push(format!(
                    "{} already existed, saved as {}",
                    receipt.suggested_name, receipt.artifact.name
                ));
            }
            notes.push(format!("File downloaded to: {}", receipt.artifact.path.display()));
            Report {
                success: true,
                headline: "Download Successful!".into(),
                details: vec![
                    ("File".into(), receipt.artifact.name.clone()),
                    ("Size".into(), receipt.artifact.formatted_size()),
                    ("Location".into(), receipt.artifact.path.display().to_string()),
                ],
                notes,
                hint: None,
                exit_code,
            }
        }
        TransferOutcome::Failure(failure) => Report {
            success: false,
            headline: format!("{}: {}", operation.failed_prefix(), failure.message),
            details: Vec::new(),
            notes: Vec::new(),
            hint: failure.hint,
            exit_code,
        },
    }
}

/// Details shown before an upload starts.
pub fn file_summary(artifact: &FileArtifact) -> Vec<(String, String)> {
    let mut rows = vec![
        ("Name".to_string(), artifact.name.clone()),
        ("Size".to_string(), artifact.formatted_size()),
        ("Path".to_string(), artifact.path.display().to_string()),
    ];
    if let Some(kind) = artifact.kind() {
        rows.push(("Type".into(), kind));
    }
    rows.push(("Modified".into(), artifact.modified_local()));
    rows
}

/// Details shown before a download starts. The password is masked.
pub fn download_summary(
    code: u16,
    destination: &Path,
    password: Option<&str>,
) -> Vec<(String, String)> {
    let mut rows = vec![
        ("File Code".to_string(), code.to_string()),
        ("Download to".to_string(), destination.display().to_string()),
    ];
    if let Some(password) = password {
        rows.push(("Password".into(), "*".repeat(password.chars().count())));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{DownloadReceipt, ErrorKind, Failure, UploadReceipt};
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn artifact(name: &str) -> FileArtifact {
        FileArtifact {
            path: PathBuf::from("/tmp").join(name),
            name: name.into(),
            size: 2048,
            extension: ".pdf".into(),
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn upload_success_lists_code_and_commands() {
        let outcome = TransferOutcome::Success(Receipt::Upload(UploadReceipt {
            code: 8081,
            artifact: artifact("doc.pdf"),
            password_protected: true,
        }));
        let report = report(Operation::Upload, outcome);

        assert!(report.success);
        assert_eq!(report.exit_code, 0);
        assert!(report
            .details
            .contains(&("File Code".to_string(), "8081".to_string())));
        assert!(report.notes.iter().any(|n| n.contains("shareio get 8081 --pass")));
    }

    #[test]
    fn unprotected_upload_has_no_password_command() {
        let outcome = TransferOutcome::Success(Receipt::Upload(UploadReceipt {
            code: 9000,
            artifact: artifact("doc.pdf"),
            password_protected: false,
        }));
        let report = report(Operation::Upload, outcome);
        assert!(!report.notes.iter().any(|n| n.contains("--pass")));
    }

    #[test]
    fn renamed_download_is_mentioned() {
        let outcome = TransferOutcome::Success(Receipt::Download(DownloadReceipt {
            artifact: artifact("doc (1).pdf"),
            suggested_name: "doc.pdf".into(),
            renamed: true,
        }));
        let report = report(Operation::Download, outcome);
        assert!(report.notes[0].contains("saved as doc (1).pdf"));
    }

    #[test]
    fn failure_carries_message_hint_and_exit_code() {
        let failure = Failure::new(ErrorKind::NotFound, "File not found - check your file code")
            .with_hint("Make sure the file code is correct");
        let report = report(Operation::Download, TransferOutcome::Failure(failure));

        assert!(!report.success);
        assert_eq!(report.exit_code, 1);
        assert_eq!(
            report.headline,
            "Download failed: File not found - check your file code"
        );
        assert_eq!(report.hint.as_deref(), Some("Make sure the file code is correct"));
    }

    #[test]
    fn summaries_mask_password_and_show_type() {
        let rows = download_summary(8081, Path::new("/downloads"), Some("secret"));
        assert!(rows.contains(&("Password".to_string(), "******".to_string())));

        let rows = file_summary(&artifact("doc.pdf"));
        assert!(rows.contains(&("Type".to_string(), "PDF".to_string())));
    }
}
