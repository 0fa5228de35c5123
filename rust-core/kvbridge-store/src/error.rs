// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Store error types for kvbridge.
//
// Covers the ways a store primitive can fail before it produces an answer:
// transport failures, malformed node addresses, unexpected replies, values
// that are not text, and connection setup with no nodes at all.

use thiserror::Error;

/// Errors that can occur when talking to the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An HTTP / network transport error from `reqwest`.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A stored value is not valid UTF-8 text.
    #[error("corrupt value for key '{key}': {reason}")]
    CorruptValue {
        /// The flat key that was read.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A node address could not be turned into a usable URL.
    #[error("invalid node address '{address}': {reason}")]
    InvalidAddress {
        /// The address as it was configured.
        address: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The node answered a read with a status the protocol does not define.
    #[error("unexpected status {status} from {node}")]
    UnexpectedStatus {
        /// HTTP status code returned by the node.
        status: u16,
        /// The node that answered.
        node: String,
    },

    /// A connection was requested with an empty node list.
    #[error("at least one store node is required")]
    EmptyNodeList,
}
