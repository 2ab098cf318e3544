//! Shared configuration for the Sempai command-line tool.
//!
//! Values are layered by `ortho_config`: built-in defaults, then a
//! `.sempai.toml` file (or the file named by `--config-path` /
//! `SEMPAI_CONFIG_PATH`), then `SEMPAI_*` environment variables, then
//! command-line flags.
//!
//! ```no_run
//! use ortho_config::OrthoConfig;
//! use sempai_config::Config;
//!
//! let config = Config::load_from_iter(["sempai", "--strict"]).expect("configuration loads");
//! assert!(config.engine_config().strict());
//! ```

mod defaults;
mod logging;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use sempai_core::EngineConfig;

pub use defaults::{
    DEFAULT_BACKEND, DEFAULT_LOG_FILTER, default_backend, default_log_filter,
    default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Configuration flags recognised on the command line, in the order they
/// are documented.
pub const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--log-filter",
    "--log-format",
    "--backend",
    "--dangerously-allow-arbitrary-code-execution-from-rules",
    "--strict",
    "--autofix",
    "--exclude-tests",
    "--no-rewrite-rule-ids",
];

/// Configuration shared by the Sempai binary and its tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SEMPAI")]
pub struct Config {
    /// Tracing filter expression, such as `info` or `sempai=debug`.
    #[serde(default = "defaults::default_log_filter_string")]
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,

    /// Log output format.
    #[serde(default)]
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,

    /// Path of the structural matcher executable.
    #[serde(default = "defaults::default_backend")]
    #[ortho_config(default = defaults::default_backend())]
    pub backend: Utf8PathBuf,

    /// Allows `pattern-where-python` side-predicates to run.
    #[serde(default)]
    #[ortho_config(default = false)]
    pub dangerously_allow_arbitrary_code_execution_from_rules: bool,

    /// Aborts on invalid rules and on matcher-reported errors.
    #[serde(default)]
    #[ortho_config(default = false)]
    pub strict: bool,

    /// Adds substituted fix text to findings.
    #[serde(default)]
    #[ortho_config(default = false)]
    pub autofix: bool,

    /// Drops findings in test and example paths.
    #[serde(default)]
    #[ortho_config(default = false)]
    pub exclude_tests: bool,

    /// Keeps rule ids exactly as written instead of prefixing them with
    /// the rule file's directory.
    #[serde(default)]
    #[ortho_config(default = false)]
    pub no_rewrite_rule_ids: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            backend: default_backend(),
            dangerously_allow_arbitrary_code_execution_from_rules: false,
            strict: false,
            autofix: false,
            exclude_tests: false,
            no_rewrite_rule_ids: false,
        }
    }
}

impl Config {
    /// Returns the tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the structural matcher executable.
    #[must_use]
    pub fn backend(&self) -> &Utf8Path {
        &self.backend
    }

    /// Returns whether rule ids keep their file-derived prefix.
    #[must_use]
    pub const fn rewrite_rule_ids(&self) -> bool {
        !self.no_rewrite_rule_ids
    }

    /// Projects the flags the engine consumes.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_side_predicates(self.dangerously_allow_arbitrary_code_execution_from_rules)
            .with_strict(self.strict)
            .with_autofix(self.autofix)
            .with_exclude_tests(self.exclude_tests)
    }
}

#[cfg(test)]
mod tests;
