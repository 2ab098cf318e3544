//! Error types and exit-code mapping for the CLI runtime.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

use sempai::{DiagnosticReport, EngineError};

use crate::telemetry::TelemetryError;

/// Findings were reported and `--error` was given.
pub const FINDINGS_EXIT_CODE: u8 = 1;
/// Usage, configuration, I/O, and internal failures.
pub const FATAL_EXIT_CODE: u8 = 2;
/// The matcher reported errors in strict mode.
pub const INVALID_CODE_EXIT_CODE: u8 = 3;
/// The matcher rejected a rule's pattern or language.
pub const INVALID_PATTERN_EXIT_CODE: u8 = 4;
/// No usable rules were loaded.
pub const MISSING_CONFIG_EXIT_CODE: u8 = 7;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to determine the working directory: {0}")]
    CurrentDir(io::Error),
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(String),
    #[error("failed to read rules from {path}: {source}")]
    ReadRules { path: Utf8PathBuf, source: io::Error },
    #[error("invalid rules in {path}: {report}")]
    InvalidRules {
        path: Utf8PathBuf,
        report: DiagnosticReport,
    },
    #[error("no valid rules were found")]
    NoRules,
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to serialise output: {0}")]
    Serialise(serde_json::Error),
    #[error("failed to write output: {0}")]
    Write(io::Error),
}

impl AppError {
    pub(crate) fn exit_code(&self) -> ExitCode {
        let code = match self {
            Self::InvalidRules { .. } | Self::NoRules | Self::Engine(EngineError::Schema(_)) => {
                MISSING_CONFIG_EXIT_CODE
            }
            Self::Engine(EngineError::StrictBackendErrors { .. }) => INVALID_CODE_EXIT_CODE,
            Self::Engine(EngineError::Backend(err)) if err.is_user_facing() => {
                INVALID_PATTERN_EXIT_CODE
            }
            _ => FATAL_EXIT_CODE,
        };
        ExitCode::from(code)
    }
}
