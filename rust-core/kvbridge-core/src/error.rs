// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Driver error types.
//
// Every failure inside the request translator is one of these. None of them
// crosses the public CRUD boundary: each maps to a `Status` there.

use kvbridge_store::StoreError;
use thiserror::Error;

use crate::codec::{DecodeError, EncodeError};
use crate::config::ConfigError;
use crate::status::Status;

/// Errors produced while translating a CRUD request into store primitives.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The store holds no value for the composite key.
    #[error("record not found")]
    NotFound,

    /// The operation is intentionally unsupported.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// The record could not be encoded for storage.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodeError),

    /// The stored value is not a well-formed record.
    #[error("decoding error: {0}")]
    Decoding(#[from] DecodeError),

    /// The store could not be reached or answered outside its protocol.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The store answered but reported the primitive as failed.
    #[error("store rejected {operation}")]
    StoreRejected {
        /// The primitive that failed (`put` or `delete`).
        operation: &'static str,
    },

    /// The driver configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DriverError {
    /// The status this error is reported as at the CRUD boundary.
    pub fn status(&self) -> Status {
        match self {
            DriverError::NotFound => Status::NotFound,
            DriverError::NotImplemented(_) => Status::NotImplemented,
            _ => Status::Error,
        }
    }
}

/// Crate-level result alias using [`DriverError`].
pub type DriverResult<T> = Result<T, DriverError>;
