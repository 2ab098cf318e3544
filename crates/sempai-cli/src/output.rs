//! Renders a run's findings for the terminal or for machines.

use std::io::Write;

use sempai::{Finding, RunOutput};

use crate::errors::AppError;

/// Output flavours selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    /// One `path:line: check_id: message` line per finding.
    Text,
    /// A single `{"results": [...], "errors": [...]}` document.
    Json,
}

impl OutputFormat {
    pub(crate) const fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

pub(crate) fn render<W: Write>(
    output: &RunOutput,
    format: OutputFormat,
    stdout: &mut W,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            let document = serde_json::to_string(output).map_err(AppError::Serialise)?;
            writeln!(stdout, "{document}").map_err(AppError::Write)
        }
        OutputFormat::Text => {
            for finding in output.findings() {
                writeln!(stdout, "{}", text_line(finding)).map_err(AppError::Write)?;
                if let Some(fix) = finding.fix() {
                    writeln!(stdout, "  fix: {fix}").map_err(AppError::Write)?;
                }
            }
            Ok(())
        }
    }
}

fn text_line(finding: &Finding) -> String {
    format!(
        "{}:{}: {}: {}",
        finding.path(),
        finding.start().line,
        finding.check_id(),
        finding.message()
    )
}
