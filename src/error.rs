use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Every failure the exporter surfaces is fatal: the process logs it and exits.
/// Fields that merely fail to parse are skipped by the extractor and never
/// become an `ExporterError`.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{field} not found in airport output")]
    MissingIdentity { field: &'static str },

    #[error("rule for {instrument} must have exactly one capture group, found {groups}")]
    InvalidRule {
        instrument: &'static str,
        groups: usize,
    },

    #[error("invalid pattern for {instrument}: {source}")]
    Pattern {
        instrument: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("refusing empty label value for {0}")]
    EmptyLabel(String),

    #[error("no instrument named {0}")]
    UnknownInstrument(String),

    #[error("prometheus registry error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("metrics encoding produced invalid utf-8")]
    Encode(#[from] std::string::FromUtf8Error),

    #[error("failed to bind metrics endpoint on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("refresh task aborted: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for ExporterError {
    fn from(err: tokio::task::JoinError) -> Self {
        ExporterError::Task(err.to_string())
    }
}
