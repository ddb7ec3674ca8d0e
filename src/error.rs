//! Error types for the layout pipeline.
//!
//! This module defines all error types that can occur while building page
//! models and reconstructing paragraphs.

/// Result type alias for layout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during page model construction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Per-page processing exceeded its wall-clock budget.
    ///
    /// This variant is deliberately distinct from all other failures: callers
    /// treat it as retryable/partial rather than fatal, and the page cache
    /// memoizes it until an explicit reload.
    #[error("Page {page} exceeded processing budget of {budget_ms} ms")]
    Timeout {
        /// One-based page number
        page: u32,
        /// The budget that was exceeded, in milliseconds
        budget_ms: u64,
    },

    /// A page identity outside the document was requested.
    #[error("Page {0} out of range")]
    PageOutOfRange(u32),
}

impl Error {
    /// Whether this error is a sticky page timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}
