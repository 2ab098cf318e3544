//! Target language identifiers passed through to the backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A target language name as written in a rule's `languages` list.
///
/// Sempai does not interpret language names; it groups patterns by them
/// and hands each group to the backend, which rejects names it does not
/// know.  Names are trimmed and lower-cased so `Python` and `python`
/// share one backend invocation.
///
/// # Example
///
/// ```
/// use sempai_core::Language;
///
/// let lang = Language::new(" Python ");
/// assert_eq!(lang.as_str(), "python");
/// assert_eq!(format!("{lang}"), "python");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Language(String);

impl Language {
    /// Creates a normalised language name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// Returns the normalised name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.0
    }
}
