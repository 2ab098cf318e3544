//! CLI entrypoint for the Sempai rule evaluator.
//!
//! The binary delegates to [`sempai_cli::run`], which loads configuration,
//! parses arguments, runs the rules through the structural matcher, and
//! prints the findings.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    sempai_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
