//! Rule-id prefixes derived from a rule file's location.

use camino::{Utf8Component, Utf8Path};

/// Returns the id prefix for rules loaded from `config_path`.
///
/// The prefix is the file's directory, relative to `cwd` when it lies
/// beneath it, with components joined by dots and a trailing dot.  Root,
/// `.` and `..` components are skipped, as are leading dots of the first
/// directory name.  A file in `cwd` itself yields an empty prefix.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use sempai_yaml::rule_id_prefix;
///
/// let cwd = Utf8Path::new("/work");
/// assert_eq!(rule_id_prefix(Utf8Path::new("/work/rules/python/x.yml"), cwd), "rules.python.");
/// assert_eq!(rule_id_prefix(Utf8Path::new("x.yml"), cwd), "");
/// ```
#[must_use]
pub fn rule_id_prefix(config_path: &Utf8Path, cwd: &Utf8Path) -> String {
    let relative = config_path.strip_prefix(cwd).unwrap_or(config_path);
    let directories: Vec<&str> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|component| match component {
                    Utf8Component::Normal(name) => Some(name),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    let joined = directories.join(".");
    let prefix = joined.trim_start_matches('.');
    if prefix.is_empty() {
        String::new()
    } else {
        format!("{prefix}.")
    }
}
