//! Metavariable bindings reported alongside backend matches.
//!
//! A binding associates a placeholder such as `$X` with the source entity
//! it matched.  The backend reports both the matched text
//! (`abstract_content`) and an identity for the underlying entity
//! (`unique_id`).  The identity takes part in range equality; the text is
//! what messages, fixes, and side-predicates see.

use serde::{Deserialize, Serialize};

use crate::range::BindingIdentity;
use crate::span::Position;

/// The backend's identity for a bound entity.
///
/// Identifiers resolved to a symbol carry a numeric `sid`; other
/// expressions carry an `md5sum` of their normalised syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueId {
    /// The identity kind reported by the backend (for example `"id"`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Symbol identifier for resolved names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<i64>,
    /// Structural digest for unresolved expressions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5sum: Option<String>,
}

/// One metavariable binding of a backend match.
///
/// # Example
///
/// ```
/// use sempai_core::{BindingIdentity, MetavarValue};
///
/// let value = MetavarValue::with_symbol("user_input", 7);
/// assert_eq!(value.text(), "user_input");
/// assert_eq!(value.identity(), BindingIdentity::Symbol(7));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetavarValue {
    /// The matched source text.
    pub abstract_content: String,
    /// The identity of the bound entity.
    #[serde(default)]
    pub unique_id: UniqueId,
    /// Start of the bound text, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Position>,
    /// End of the bound text, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Position>,
}

impl MetavarValue {
    /// Creates a binding that only carries text.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            abstract_content: text.into(),
            unique_id: UniqueId::default(),
            start: None,
            end: None,
        }
    }

    /// Creates a binding resolved to a symbol identifier.
    #[must_use]
    pub fn with_symbol(text: impl Into<String>, sid: i64) -> Self {
        let mut value = Self::from_text(text);
        value.unique_id.kind = Some(String::from("id"));
        value.unique_id.sid = Some(sid);
        value
    }

    /// Returns the matched source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.abstract_content
    }

    /// Returns the identity used when comparing ranges.
    ///
    /// Symbol ids win over digests; when the backend reported neither, the
    /// matched text stands in.
    #[must_use]
    pub fn identity(&self) -> BindingIdentity {
        if let Some(sid) = self.unique_id.sid {
            return BindingIdentity::Symbol(sid);
        }
        self.unique_id.md5sum.as_ref().map_or_else(
            || BindingIdentity::Text(self.abstract_content.clone()),
            |digest| BindingIdentity::Digest(digest.clone()),
        )
    }
}
