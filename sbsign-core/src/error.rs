//! Typed error kinds for `sbsign-core`.
//!
//! Every fallible operation in this crate returns one of these variants
//! rather than an opaque, string-only error, so callers can branch on
//! *what* failed (e.g. to decide whether an out-of-range signature index
//! is a user mistake vs. a malformed image).

use thiserror::Error;

/// The error type returned by all fallible `sbsign-core` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Any header-validation failure: file too short, bad magic,
    /// optional header too small to hold a security data directory entry,
    /// and so on.
    #[error("malformed PE/COFF header: {0}")]
    MalformedHeader(String),

    /// The optional-header magic or machine type falls outside the
    /// supported PE32/PE32+ and i386/x86_64/ARM-Thumb/AArch64 sets.
    #[error("unsupported PE variant: {0}")]
    UnsupportedVariant(String),

    /// `get_signature`/`remove_signature` called with an index at or
    /// past the current entry count.
    #[error("signature index {index} out of range (have {count})")]
    SignatureOutOfRange {
        /// The index that was requested.
        index: usize,
        /// The number of signature entries actually present.
        count: usize,
    },

    /// The SHA-256 implementation reported a failure.
    #[error("cryptographic operation failed: {0}")]
    CryptoFailure(String),

    /// Propagated from a `load`/`write` collaborator.
    #[error("I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
