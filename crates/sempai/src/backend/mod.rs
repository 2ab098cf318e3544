//! The contract with the external structural matcher.
//!
//! The engine sends one [`BackendRequest`] per target language: every leaf
//! pattern for that language, the target files, and the caller's target
//! filters.  The [`Backend`] answers with a [`BackendResponse`] listing each
//! match and any non-fatal errors.
//!
//! [`ProcessBackend`] is the production implementation; tests substitute
//! their own.

mod process;
mod protocol;

pub use process::ProcessBackend;
pub(crate) use protocol::INTERNAL_MESSAGE;
pub use protocol::{
    BackendRequest, BackendResponse, FatalError, MatchExtra, PatternRecord, RawMatch,
    ReportedError, TargetFilters,
};

use crate::error::BackendError;

/// Runs a batch of patterns against a set of targets.
///
/// # Example
///
/// ```
/// use sempai::backend::{Backend, BackendRequest, BackendResponse};
/// use sempai::BackendError;
///
/// struct NoMatches;
///
/// impl Backend for NoMatches {
///     fn run(&self, _request: &BackendRequest) -> Result<BackendResponse, BackendError> {
///         Ok(BackendResponse::default())
///     }
/// }
/// ```
pub trait Backend {
    /// Matches every pattern in `request` against its targets.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the matcher rejects a pattern or
    /// language, cannot be run, or produces output outside the contract.
    fn run(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError>;
}

#[cfg(test)]
mod tests;
