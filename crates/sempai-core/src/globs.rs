//! Per-rule path filters from a rule's `paths:` section.

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use thiserror::Error;

/// Errors raised while compiling path globs.
#[derive(Debug, Error)]
pub enum GlobError {
    /// A glob could not be compiled.
    #[error("invalid path glob '{glob}': {source}")]
    InvalidGlob {
        /// The offending glob text.
        glob: String,
        /// The underlying compile error.
        #[source]
        source: globset::Error,
    },
}

/// Include and exclude globs restricting where a rule reports findings.
///
/// A glob that is not anchored (no leading `/` or `**`) matches from the
/// right of the path, so `*.py` matches `src/app.py`.  A glob naming a
/// directory also matches everything beneath it.  `*` never crosses a
/// path separator.
///
/// # Example
///
/// ```
/// use sempai_core::RuleGlobs;
///
/// let globs = RuleGlobs::new(["*.py"], ["tests"])?;
/// assert!(globs.matches("src/app.py"));
/// assert!(!globs.matches("tests/test_app.py"));
/// assert!(!globs.matches("src/app.js"));
/// # Ok::<(), sempai_core::GlobError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RuleGlobs {
    included: Vec<String>,
    excluded: Vec<String>,
    include_set: GlobSet,
    exclude_set: GlobSet,
}

impl RuleGlobs {
    /// Compiles include and exclude globs.
    ///
    /// # Errors
    ///
    /// Returns [`GlobError::InvalidGlob`] for the first glob that fails
    /// to compile.
    pub fn new<I, E, S, T>(included: I, excluded: E) -> Result<Self, GlobError>
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let included_globs: Vec<String> = included.into_iter().map(Into::into).collect();
        let excluded_globs: Vec<String> = excluded.into_iter().map(Into::into).collect();
        let include_set = compile(&included_globs)?;
        let exclude_set = compile(&excluded_globs)?;
        Ok(Self {
            included: included_globs,
            excluded: excluded_globs,
            include_set,
            exclude_set,
        })
    }

    /// Returns filters that accept every path.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self {
            included: Vec::new(),
            excluded: Vec::new(),
            include_set: GlobSet::empty(),
            exclude_set: GlobSet::empty(),
        }
    }

    /// Returns the include globs as written.
    #[must_use]
    pub fn included(&self) -> &[String] {
        &self.included
    }

    /// Returns the exclude globs as written.
    #[must_use]
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    /// Returns `true` when a finding at `path` should be kept.
    ///
    /// Excludes win; when include globs exist, at least one must match.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        if self.exclude_set.is_match(path) {
            return false;
        }
        self.included.is_empty() || self.include_set.is_match(path)
    }
}

impl Default for RuleGlobs {
    fn default() -> Self {
        Self::unrestricted()
    }
}

fn compile(globs: &[String]) -> Result<GlobSet, GlobError> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        for variant in variants(glob) {
            builder.add(build(glob, &variant)?);
        }
    }
    builder.build().map_err(|source| GlobError::InvalidGlob {
        glob: globs.join(", "),
        source,
    })
}

fn variants(glob: &str) -> Vec<String> {
    let trimmed = glob.trim_end_matches('/');
    let anchored = trimmed.starts_with('/') || trimmed.starts_with("**");
    let mut forms = vec![trimmed.to_owned(), format!("{trimmed}/**")];
    if !anchored {
        forms.push(format!("**/{trimmed}"));
        forms.push(format!("**/{trimmed}/**"));
    }
    forms
}

fn build(original: &str, variant: &str) -> Result<Glob, GlobError> {
    GlobBuilder::new(variant)
        .literal_separator(true)
        .build()
        .map_err(|source| GlobError::InvalidGlob {
            glob: original.to_owned(),
            source,
        })
}
