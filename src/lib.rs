// Library root
// -----------
// This crate exposes the transfer pipeline behind the `shareio` binary.
//
// Module responsibilities:
// - `config`: environment derived settings, built once and passed down.
// - `validation`: local precondition checks run before any network call.
// - `api`: HTTP interaction with the backend (health, upload, download).
// - `classify`: maps transport/HTTP faults to the user facing taxonomy.
// - `placement`: collision-free destination paths for downloads.
// - `progress`: the progress sink abstraction the transfer code reports to.
// - `outcome` / `report`: terminal results and their render-ready form.
// - `ui`: terminal rendering (progress bars, styled text).
// - `cli` / `commands`: argument parsing and the per-command pipelines.
pub mod api;
pub mod artifact;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod outcome;
pub mod placement;
pub mod progress;
pub mod report;
pub mod ui;
pub mod validation;

pub use api::ApiClient;
pub use artifact::FileArtifact;
pub use config::Config;
pub use outcome::{ErrorKind, Failure, TransferOutcome};
pub use progress::{ProgressSink, SharedSink};
