//! Reads rule files and directories into one rule set.

use std::fs;
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use sempai::backend::Backend;
use sempai::{Engine, EngineError, RuleSet, rule_id_prefix};

use crate::errors::AppError;

const LOAD_TARGET: &str = "sempai_cli::rules";
const RULE_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// Where rules come from and how their ids are rewritten.
pub(crate) struct RuleSources<'a> {
    pub(crate) paths: &'a [Utf8PathBuf],
    pub(crate) cwd: &'a Utf8Path,
    pub(crate) rewrite_ids: bool,
}

/// Loads every rule file named by `sources`.
///
/// Directories are walked recursively for `.yml`, `.yaml`, and `.json`
/// files, skipping hidden entries.  Outside strict mode, invalid rules and
/// unparseable files are reported on `stderr` and skipped.
pub(crate) fn load<B, E>(
    sources: &RuleSources<'_>,
    engine: &Engine<B>,
    stderr: &mut E,
) -> Result<RuleSet, AppError>
where
    B: Backend,
    E: Write,
{
    let mut files = Vec::new();
    for path in sources.paths {
        collect_rule_files(path, &mut files)?;
    }

    let mut rules = RuleSet::default();
    for file in &files {
        let source = fs::read_to_string(file).map_err(|source| AppError::ReadRules {
            path: file.clone(),
            source,
        })?;
        let loaded = match engine.compile_yaml(&source) {
            Ok(loaded) => loaded,
            Err(EngineError::Schema(report)) if !engine.config().strict() => {
                warn!(target: LOAD_TARGET, path = %file, "skipping unreadable rule file");
                writeln!(stderr, "warning: skipping {file}: {report}").map_err(AppError::Write)?;
                continue;
            }
            Err(EngineError::Schema(report)) => {
                return Err(AppError::InvalidRules {
                    path: file.clone(),
                    report,
                });
            }
            Err(other) => return Err(other.into()),
        };
        for diagnostic in loaded.invalid().diagnostics() {
            warn!(target: LOAD_TARGET, path = %file, %diagnostic, "skipping invalid rule");
            writeln!(stderr, "warning: skipping invalid rule in {file}: {diagnostic}")
                .map_err(AppError::Write)?;
        }
        let prefixed = if sources.rewrite_ids {
            loaded.with_id_prefix(&rule_id_prefix(file, sources.cwd))
        } else {
            loaded
        };
        debug!(target: LOAD_TARGET, path = %file, rules = prefixed.valid().len(), "loaded rules");
        rules.merge(prefixed);
    }

    if rules.valid().is_empty() {
        return Err(AppError::NoRules);
    }
    Ok(rules)
}

fn collect_rule_files(path: &Utf8Path, files: &mut Vec<Utf8PathBuf>) -> Result<(), AppError> {
    if !path.is_dir() {
        files.push(path.to_owned());
        return Ok(());
    }

    let walker = WalkDir::new(path)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
    for item in walker {
        let entry = item.map_err(|error| walk_error(path, error))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file = Utf8PathBuf::from_path_buf(entry.into_path())
            .map_err(|other| AppError::NonUtf8Path(other.display().to_string()))?;
        if file
            .extension()
            .is_some_and(|extension| RULE_EXTENSIONS.contains(&extension))
        {
            files.push(file);
        }
    }
    Ok(())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn walk_error(root: &Utf8Path, error: walkdir::Error) -> AppError {
    let path = error
        .path()
        .and_then(Utf8Path::from_path)
        .map_or_else(|| root.to_owned(), Utf8Path::to_owned);
    AppError::ReadRules {
        path,
        source: io::Error::from(error),
    }
}
