//! Structural matcher invoked as a child process.
//!
//! [`ProcessBackend`] writes the request's patterns to a temporary rules
//! file, runs the matcher executable over the targets, and parses the JSON
//! it prints on stdout.

use std::io::Write;
use std::process::{Command, Output};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::backend::Backend;
use crate::backend::protocol::{
    BackendRequest, BackendResponse, FatalError, PatternRecord, TargetFilters,
};
use crate::error::BackendError;

/// Tracing target for matcher process operations.
const BACKEND_TARGET: &str = "sempai::backend::process";

const INVALID_LANGUAGE: &str = "invalid language";
const INVALID_PATTERN: &str = "invalid pattern";

/// Runs a matcher executable once per request.
///
/// # Example
///
/// ```rust,no_run
/// use sempai::backend::{Backend, BackendRequest, ProcessBackend, TargetFilters};
/// use sempai::Language;
///
/// let backend = ProcessBackend::new("semgrep-core");
/// let request = BackendRequest {
///     language: Language::new("python"),
///     patterns: vec![],
///     targets: vec!["src".into()],
///     filters: TargetFilters::default(),
/// };
/// let response = backend.run(&request);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBackend {
    program: Utf8PathBuf,
}

impl ProcessBackend {
    /// Creates a backend running `program`.
    #[must_use]
    pub fn new(program: impl Into<Utf8PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the executable path.
    #[must_use]
    pub fn program(&self) -> &Utf8Path {
        &self.program
    }
}

impl Backend for ProcessBackend {
    fn run(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        let language = request.language.as_str();
        let rules_file = write_rules_file(request)?;
        let mut command = Command::new(self.program.as_std_path());
        command
            .arg("-lang")
            .arg(language)
            .arg("-rules_file")
            .arg(rules_file.path())
            .args(targeting_options(&request.filters))
            .args(request.targets.iter().map(|target| target.as_std_path()));

        debug!(
            target: BACKEND_TARGET,
            program = %self.program,
            language,
            patterns = request.patterns.len(),
            targets = request.targets.len(),
            "invoking matcher"
        );

        let output = command.output().map_err(|err| BackendError::Spawn {
            program: self.program.to_string(),
            source: Arc::new(err),
        })?;
        log_stderr(language, &output);

        if output.status.success() {
            parse_response(language, &output.stdout)
        } else {
            Err(classify_failure(language, &output))
        }
    }
}

#[derive(Serialize)]
struct RulesFile<'a> {
    rules: &'a [PatternRecord],
}

fn write_rules_file(request: &BackendRequest) -> Result<NamedTempFile, BackendError> {
    let language = request.language.as_str();
    let io_error = |err: std::io::Error| BackendError::RulesFile {
        language: language.to_owned(),
        source: Arc::new(err),
    };
    let mut file = tempfile::Builder::new()
        .prefix("sempai-rules-")
        .suffix(".json")
        .tempfile()
        .map_err(io_error)?;
    let body = serde_json::to_vec(&RulesFile {
        rules: &request.patterns,
    })
    .map_err(|err| io_error(err.into()))?;
    file.write_all(&body).map_err(io_error)?;
    file.flush().map_err(io_error)?;
    Ok(file)
}

/// Builds the `-include` / `-exclude` / `-exclude-dir` arguments.
pub(crate) fn targeting_options(filters: &TargetFilters) -> Vec<&str> {
    let mut options = Vec::new();
    for glob in &filters.include {
        options.extend(["-include", glob.as_str()]);
    }
    for glob in &filters.exclude {
        options.extend(["-exclude", glob.as_str()]);
    }
    for glob in &filters.exclude_dirs {
        options.extend(["-exclude-dir", glob.as_str()]);
    }
    options
}

pub(crate) fn parse_response(language: &str, stdout: &[u8]) -> Result<BackendResponse, BackendError> {
    serde_json::from_slice(stdout).map_err(|err| BackendError::InvalidOutput {
        language: language.to_owned(),
        message: err.to_string(),
    })
}

pub(crate) fn classify_failure(language: &str, output: &Output) -> BackendError {
    let Ok(fatal) = serde_json::from_slice::<FatalError>(&output.stdout) else {
        return BackendError::NonZeroExit {
            language: language.to_owned(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        };
    };
    match fatal.error.as_str() {
        INVALID_LANGUAGE => BackendError::InvalidLanguage {
            language: fatal.language.unwrap_or_else(|| language.to_owned()),
        },
        INVALID_PATTERN => BackendError::InvalidPattern {
            rule_id: None,
            check_id: fatal.pattern_id,
            language: language.to_owned(),
            pattern: fatal.pattern.unwrap_or_default(),
            message: fatal.message.unwrap_or_default(),
        },
        _ => BackendError::Failed {
            language: language.to_owned(),
            kind: fatal.error,
            message: fatal.message.unwrap_or_default(),
        },
    }
}

fn log_stderr(language: &str, output: &Output) {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        debug!(
            target: BACKEND_TARGET,
            language,
            stderr = %stderr.trim(),
            "matcher stderr output"
        );
    }
}

