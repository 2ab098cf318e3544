//! Command-line arguments that are not configuration.

use camino::Utf8PathBuf;
use clap::Parser;

use sempai::backend::TargetFilters;

/// Runs boolean structural-search rules over source files.
#[derive(Debug, Parser)]
#[command(name = "sempai", version, about)]
pub(crate) struct Cli {
    /// Rule file, or directory of `.yml`, `.yaml` and `.json` rule files.
    #[arg(short = 'f', long = "rules", value_name = "PATH", required = true)]
    pub(crate) rules: Vec<Utf8PathBuf>,

    /// Prints findings and errors as a JSON document.
    #[arg(long)]
    pub(crate) json: bool,

    /// Exits with a non-zero status when there are findings.
    #[arg(long)]
    pub(crate) error: bool,

    /// Only scans files matching this glob.
    #[arg(long, value_name = "GLOB")]
    pub(crate) include: Vec<String>,

    /// Skips files matching this glob.
    #[arg(long, value_name = "GLOB")]
    pub(crate) exclude: Vec<String>,

    /// Skips directories matching this glob.
    #[arg(long = "exclude-dir", value_name = "GLOB")]
    pub(crate) exclude_dir: Vec<String>,

    /// Files and directories to scan.
    #[arg(value_name = "TARGET", default_value = ".")]
    pub(crate) targets: Vec<Utf8PathBuf>,
}

impl Cli {
    pub(crate) fn filters(&self) -> TargetFilters {
        TargetFilters {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            exclude_dirs: self.exclude_dir.clone(),
        }
    }
}
