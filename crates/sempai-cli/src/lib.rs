//! Command-line runtime for the Sempai rule evaluator.
//!
//! The runtime splits configuration flags from command arguments, loads
//! layered configuration, installs telemetry, reads the rule files, runs
//! them through the structural matcher, and prints the findings.  It can
//! be driven from the binary or from tests with substitute streams,
//! configuration loaders, and matchers.
//!
//! # Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success, or findings without `--error` |
//! | [`FINDINGS_EXIT_CODE`] | Findings with `--error` |
//! | [`FATAL_EXIT_CODE`] | Usage, configuration, I/O, or internal failure |
//! | [`INVALID_CODE_EXIT_CODE`] | Matcher errors in strict mode |
//! | [`INVALID_PATTERN_EXIT_CODE`] | The matcher rejected a pattern or language |
//! | [`MISSING_CONFIG_EXIT_CODE`] | No usable rules |

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use tracing::debug;

use sempai::backend::{Backend, ProcessBackend};
use sempai::{Engine, RunOutput};
use sempai_config::Config;

mod cli;
mod config;
mod errors;
mod output;
mod rules;
mod telemetry;

use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use errors::AppError;
pub use errors::{
    FATAL_EXIT_CODE, FINDINGS_EXIT_CODE, INVALID_CODE_EXIT_CODE, INVALID_PATTERN_EXIT_CODE,
    MISSING_CONFIG_EXIT_CODE,
};
use output::{OutputFormat, render};
use rules::RuleSources;

const CLI_TARGET: &str = "sempai_cli";

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with(args, stdout, stderr, &OrthoConfigLoader, |config: &Config| {
        ProcessBackend::new(config.backend().to_owned())
    })
}

pub(crate) fn run_with<I, W, E, L, B, F>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
    make_backend: F,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
    B: Backend,
    F: FnOnce(&Config) -> B,
{
    let arguments: Vec<OsString> = args.into_iter().collect();
    match execute(&arguments, stdout, stderr, loader, make_backend) {
        Ok(exit_code) => exit_code,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            error.exit_code()
        }
    }
}

fn execute<W, E, L, B, F>(
    args: &[OsString],
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
    make_backend: F,
) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
    B: Backend,
    F: FnOnce(&Config) -> B,
{
    let split = split_config_arguments(args);
    let cli = Cli::try_parse_from(&split.command_arguments).map_err(AppError::CliUsage)?;
    let config = loader.load(&split.config_arguments)?;
    telemetry::initialise(&config)?;

    let cwd = current_dir()?;
    let engine = Engine::new(config.engine_config(), make_backend(&config));
    let sources = RuleSources {
        paths: &cli.rules,
        cwd: &cwd,
        rewrite_ids: config.rewrite_rule_ids(),
    };
    let rule_set = rules::load(&sources, &engine, stderr)?;
    debug!(target: CLI_TARGET, rules = rule_set.valid().len(), "rules loaded");

    let outcome = engine.run(rule_set.valid(), &cli.targets, &cli.filters())?;
    let format = OutputFormat::from_flag(cli.json);
    report_warnings(&outcome, format, stderr)?;
    render(&outcome, format, stdout)?;

    if cli.error && !outcome.findings().is_empty() {
        return Ok(ExitCode::from(FINDINGS_EXIT_CODE));
    }
    Ok(ExitCode::SUCCESS)
}

fn report_warnings<E: Write>(
    outcome: &RunOutput,
    format: OutputFormat,
    stderr: &mut E,
) -> Result<(), AppError> {
    if format == OutputFormat::Text {
        for error in outcome.errors() {
            writeln!(
                stderr,
                "warning: {}: {}",
                error.path.as_deref().unwrap_or("<unknown>"),
                error.message().unwrap_or("matcher reported an error")
            )
            .map_err(AppError::Write)?;
        }
    }
    let ignored = outcome.excluded_test_findings();
    if ignored > 0 {
        writeln!(
            stderr,
            "warning: ignored {ignored} results in tests due to --exclude-tests option"
        )
        .map_err(AppError::Write)?;
    }
    Ok(())
}

fn current_dir() -> Result<Utf8PathBuf, AppError> {
    let cwd = std::env::current_dir().map_err(AppError::CurrentDir)?;
    Utf8PathBuf::from_path_buf(cwd).map_err(|path| AppError::NonUtf8Path(path.display().to_string()))
}

#[cfg(test)]
mod tests;
