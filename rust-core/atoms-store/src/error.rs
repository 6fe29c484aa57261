// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error types for the Atoms item store.
//
// Absence is never an error: `read`, `delete` and `search` report a missing
// item as `Ok(None)` or an empty map. Everything below is a real failure that
// is returned to the immediate caller without retry.

use thiserror::Error;

/// Errors that can occur when reading or writing items.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A value, or the item already stored under a name, does not have the
    /// shape the operation requires.
    #[error("invalid shape for '{name}': {reason}")]
    InvalidShape {
        /// Name of the item the operation targeted.
        name: String,
        /// What did not match.
        reason: String,
    },

    /// A null value was handed to a write operation.
    #[error("absent value for '{0}'")]
    AbsentValue(String),

    /// Item names must be non-empty.
    #[error("invalid item name: {0:?}")]
    InvalidName(String),

    /// A map key collides with one of the reserved row attributes.
    #[error("map key '{key}' of '{name}' is a reserved attribute")]
    ReservedKey {
        /// Name of the item being encoded.
        name: String,
        /// The offending map key.
        key: String,
    },

    /// A stored row carries a known shape tag but a malformed payload, or the
    /// medium reported corruption.
    #[error("corrupted data: {0}")]
    CorruptedData(String),

    /// Failed to serialize or deserialize a row.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The persistence medium could not be reached.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// An I/O error occurred while opening or sizing a table.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Shorthand for [`StoreError::InvalidShape`].
    pub fn invalid_shape(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's input rather than the medium.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidShape { .. }
                | Self::AbsentValue(_)
                | Self::InvalidName(_)
                | Self::ReservedKey { .. }
        )
    }
}
