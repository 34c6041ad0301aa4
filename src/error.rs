//! # Error Handling
//!
//! Unifies the protocol-level error taxonomy (size/value/peer-busy/timeout/
//! remote) with the small set of ambient failures the core can hit on its
//! own (codec, configuration).
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  Error (top-level)                                                      │
//! │  │                                                                      │
//! │  ├── Protocol Errors (100-199) — one per flow, always terminal          │
//! │  │   ├── SizeError     - blob exceeds binary_size_limit                 │
//! │  │   ├── ValueError    - write-request advertised data_size <= 0        │
//! │  │   ├── PeerBusy      - conflicting transfer already active for peer   │
//! │  │   ├── Timeout       - no forward progress within timeout_interval    │
//! │  │   └── Remote        - peer reported an error for this flow           │
//! │  │                                                                      │
//! │  ├── Configuration Errors (200-299)                                     │
//! │  │   └── InvalidConfig - a TransferConfig value is out of range         │
//! │  │                                                                      │
//! │  └── Ambient Errors (900-999)                                           │
//! │      ├── Codec        - packet failed to encode/decode                 │
//! │      └── Overlay      - the overlay's send primitive failed            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for this crate's fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the transfer core.
///
/// Protocol errors (§7) are always terminal for the flow they concern: the
/// transfer is released and an error callback is invoked. They are distinct
/// from the *silent rejections* (stale ack, mismatched nonce, duplicate
/// `send_binary`, …) which are protocol-level filters and never surface here.
#[derive(Error, Debug, Clone)]
pub enum Error {
    // ========================================================================
    // Protocol Errors (100-199)
    // ========================================================================
    /// The blob exceeds `binary_size_limit`, either at admission (sender) or
    /// at write-request receipt / accumulation (receiver).
    #[error("transfer {id} exceeds the binary size limit ({size} > {limit} bytes)")]
    SizeError {
        /// Application-assigned transfer id.
        id: String,
        /// The offending size.
        size: u64,
        /// The configured limit.
        limit: u64,
    },

    /// A write-request advertised a non-positive `data_size`.
    #[error("transfer {id} advertised an invalid data_size ({data_size})")]
    ValueError {
        /// Application-assigned transfer id.
        id: String,
        /// The advertised size.
        data_size: i64,
    },

    /// An incoming write-request arrived while an unrelated transfer with
    /// that peer was already active.
    #[error("peer is busy with another transfer; rejected {id}")]
    PeerBusy {
        /// The transfer id that was rejected.
        id: String,
    },

    /// No forward progress was observed within `timeout_interval`.
    #[error("transfer {id} timed out after no progress for {elapsed_ms}ms")]
    Timeout {
        /// Application-assigned transfer id.
        id: String,
        /// Milliseconds since the last recorded progress.
        elapsed_ms: i64,
    },

    /// The remote peer reported an error for this flow.
    #[error("peer reported an error for transfer {id}: {message}")]
    Remote {
        /// Application-assigned transfer id.
        id: String,
        /// The sender-supplied error message.
        message: String,
    },

    // ========================================================================
    // Configuration Errors (200-299)
    // ========================================================================
    /// A `TransferConfig` field was out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Ambient Errors (900-999)
    // ========================================================================
    /// A packet failed to encode or decode.
    #[error("codec error: {0}")]
    Codec(String),

    /// The overlay's send primitive reported failure. The core treats this
    /// as fire-and-forget and does not retry; this variant exists only so
    /// an embedder can log it.
    #[error("overlay send failed: {0}")]
    Overlay(String),
}

impl Error {
    /// Stable small-integer error code, for embedders that bridge errors
    /// across a process or language boundary.
    pub fn code(&self) -> i32 {
        match self {
            Error::SizeError { .. } => 100,
            Error::ValueError { .. } => 101,
            Error::PeerBusy { .. } => 102,
            Error::Timeout { .. } => 103,
            Error::Remote { .. } => 104,
            Error::InvalidConfig(_) => 200,
            Error::Codec(_) => 900,
            Error::Overlay(_) => 901,
        }
    }

    /// The transfer id this error concerns, if any (ambient errors have none).
    pub fn transfer_id(&self) -> Option<&str> {
        match self {
            Error::SizeError { id, .. }
            | Error::ValueError { id, .. }
            | Error::PeerBusy { id }
            | Error::Timeout { id, .. }
            | Error::Remote { id, .. } => Some(id),
            Error::InvalidConfig(_) | Error::Codec(_) | Error::Overlay(_) => None,
        }
    }

    /// Whether this error should also be transmitted back to the sender as
    /// an error packet (§7 propagation policy): only sender-caused errors
    /// detected on the receive side.
    pub fn notifies_remote(&self) -> bool {
        matches!(self, Error::SizeError { .. } | Error::ValueError { .. } | Error::PeerBusy { .. })
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Codec(err.to_string())
    }
}
