//! Crate-local error type.

use thiserror::Error;

/// Errors surfaced synchronously by logger and handler operations.
#[derive(Debug, Error)]
pub enum Error {
    /// `end` was called with no matching open block. A programming error in
    /// the instrumented code, never retried or swallowed.
    #[error("`end` called with no open explanation block")]
    ImbalancedBlock,

    /// A handler's underlying sink failed to open, write, or close.
    #[error("explanation sink I/O failure: {0}")]
    Sink(#[from] std::io::Error),
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;
