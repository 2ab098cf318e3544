//! Engine configuration: feature gates and run policy.

/// Engine configuration controlling side-predicate execution, strictness,
/// autofix, and test-path filtering.
///
/// # Defaults
///
/// Every switch is off by default:
///
/// - `allow_side_predicates`: `false` (rules with `pattern-where-python`
///   fail the run)
/// - `strict`: `false` (invalid rules and backend errors are warnings)
/// - `autofix`: `false` (no fix text is produced)
/// - `exclude_tests`: `false`
///
/// # Example
///
/// ```
/// use sempai_core::EngineConfig;
///
/// let config = EngineConfig::default().with_strict(true);
/// assert!(config.strict());
/// assert!(!config.allow_side_predicates());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Whether rules may run side-predicates over metavariable bindings.
    allow_side_predicates: bool,
    /// Whether invalid rules and backend errors abort the run.
    strict: bool,
    /// Whether findings carry substituted fix text.
    autofix: bool,
    /// Whether findings under test or example directories are dropped.
    exclude_tests: bool,
}

impl EngineConfig {
    /// Returns a copy with side-predicate execution switched on or off.
    #[must_use]
    pub const fn with_side_predicates(mut self, allow: bool) -> Self {
        self.allow_side_predicates = allow;
        self
    }

    /// Returns a copy with strict mode switched on or off.
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns a copy with autofix switched on or off.
    #[must_use]
    pub const fn with_autofix(mut self, autofix: bool) -> Self {
        self.autofix = autofix;
        self
    }

    /// Returns a copy with test-path exclusion switched on or off.
    #[must_use]
    pub const fn with_exclude_tests(mut self, exclude_tests: bool) -> Self {
        self.exclude_tests = exclude_tests;
        self
    }

    /// Returns whether side-predicates may run.
    #[must_use]
    pub const fn allow_side_predicates(&self) -> bool {
        self.allow_side_predicates
    }

    /// Returns whether strict mode is on.
    #[must_use]
    pub const fn strict(&self) -> bool {
        self.strict
    }

    /// Returns whether autofix is on.
    #[must_use]
    pub const fn autofix(&self) -> bool {
        self.autofix
    }

    /// Returns whether test paths are excluded.
    #[must_use]
    pub const fn exclude_tests(&self) -> bool {
        self.exclude_tests
    }
}
