//! # Wire Protocol
//!
//! The four message payload types of §6, plus a `bincode`-backed
//! encode/decode pair standing in for "assumed available" wire
//! serialization (§4.7) — bit layout is genuinely the overlay's concern;
//! this codec exists so the crate is runnable and testable standalone.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Request to open a new transfer, carrying the blob's size and chunking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    /// Total blob size in bytes, as advertised by the sender.
    pub data_size: i64,
    /// `ceil(data_size / block_size)`.
    pub block_count: i32,
    /// Identifies this attempt among concurrent attempts of the same `id`.
    pub nonce: u64,
    /// Application-assigned blob identifier.
    pub id: String,
    /// Opaque UTF-8 routing hint.
    pub info: Vec<u8>,
}

/// Acknowledges receipt up to (but not including) `number`, and advertises
/// the receiver's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// Next expected block index.
    pub number: i32,
    /// Receiver's current window, in blocks.
    pub window_size: i32,
    /// The flow this acknowledgement belongs to.
    pub nonce: u64,
}

/// A single block of blob data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    /// Zero-based index of this block.
    pub block_number: i32,
    /// The flow this block belongs to.
    pub nonce: u64,
    /// The block's bytes (may be shorter than `block_size` for the last block).
    pub data: Vec<u8>,
}

/// Reports a protocol-level failure for a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable description of the failure.
    pub message: String,
    /// The `id` of the affected transfer.
    pub info: String,
}

/// Any one of the four message kinds exchanged between peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// See [`WriteRequest`].
    WriteRequest(WriteRequest),
    /// See [`Acknowledgement`].
    Acknowledgement(Acknowledgement),
    /// See [`Data`].
    Data(Data),
    /// See [`ErrorPayload`].
    Error(ErrorPayload),
}

impl Message {
    /// Encode to the wire format.
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(Error::from)
    }

    /// Decode from the wire format.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_request_round_trips() {
        let msg = Message::WriteRequest(WriteRequest {
            data_size: 15,
            block_count: 2,
            nonce: 42,
            id: "x".into(),
            info: b"app".to_vec(),
        });
        let bytes = msg.encode().unwrap();
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn data_round_trips() {
        let msg = Message::Data(Data {
            block_number: 1,
            nonce: 7,
            data: b"KLMNO".to_vec(),
        });
        let bytes = msg.encode().unwrap();
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(Message::decode(&[0xff, 0x00, 0x01]).is_err());
    }
}
