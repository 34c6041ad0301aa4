//! # Transfer State Record
//!
//! The per-flow mutable record (§3, §4.1). Pure data plus the handful of
//! predicates the send/receive FSMs (`send.rs`, `receive.rs`) and the timer
//! subsystem need; all mutation happens in those modules, never here.

pub mod receive;
pub mod send;

use crate::overlay::PeerId;

/// Which side of a flow this record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// This process is the sender.
    Outgoing,
    /// This process is the receiver.
    Incoming,
}

/// A single in-flight flow (§3 "Transfer").
#[derive(Debug, Clone)]
pub struct Transfer {
    /// Which side of the flow this record represents.
    pub direction: Direction,
    /// Opaque identity of the remote peer.
    pub peer_id: PeerId,
    /// Application-assigned blob identifier.
    pub id: String,
    /// Opaque UTF-8 routing hint.
    pub info: Vec<u8>,
    /// Distinguishes concurrent attempts of the same `id`.
    pub nonce: u64,
    /// `ceil(data_size / block_size)`.
    pub block_count: i32,
    /// Outgoing: last block acked. Incoming: last block received.
    /// `-1` until the first block has been confirmed.
    pub block_number: i32,
    /// Receive side: next expected block index.
    pub acknowledgement_number: i32,
    /// Current window, in blocks.
    pub window_size: i32,
    /// Expected total bytes (receive) / actual total bytes (send).
    pub data_size: i64,
    /// Send: the source blob. Receive: the accumulating buffer.
    pub data: Vec<u8>,
    /// Acknowledgement-retransmit attempt counter (receive side).
    pub attempt: u32,
    /// Timestamp (ms since epoch) of last forward progress.
    pub updated: i64,
    /// Set once by [`Transfer::release`]; no further mutation occurs after.
    pub released: bool,
    /// The last progress marker reported, to detect the next 5% crossing.
    progress_floor: i32,
}

impl Transfer {
    /// Construct a fresh outgoing transfer.
    pub fn new_outgoing(
        peer_id: PeerId,
        id: String,
        info: Vec<u8>,
        nonce: u64,
        data: Vec<u8>,
        block_size: u32,
        now: i64,
    ) -> Self {
        let data_size = data.len() as i64;
        let block_count = block_count_for(data_size, block_size);
        Self {
            direction: Direction::Outgoing,
            peer_id,
            id,
            info,
            nonce,
            block_count,
            block_number: -1,
            acknowledgement_number: 0,
            window_size: 0,
            data_size,
            data,
            attempt: 0,
            updated: now,
            released: false,
            progress_floor: -1,
        }
    }

    /// Construct a fresh incoming transfer, admitted after validation.
    pub fn new_incoming(
        peer_id: PeerId,
        id: String,
        info: Vec<u8>,
        nonce: u64,
        data_size: i64,
        block_count: i32,
        window_size: i32,
        now: i64,
    ) -> Self {
        Self {
            direction: Direction::Incoming,
            peer_id,
            id,
            info,
            nonce,
            block_count,
            block_number: -1,
            acknowledgement_number: 0,
            window_size,
            data_size,
            data: Vec::with_capacity(data_size.max(0) as usize),
            attempt: 0,
            updated: now,
            released: false,
            progress_floor: -1,
        }
    }

    /// Whether `block_number` crossed a new 5%-of-`block_count` boundary
    /// since the last call, per §4.1 / §9's integer-comparison guidance.
    pub fn is_progress_marker(&mut self) -> bool {
        if self.block_count <= 0 {
            return false;
        }
        let pct = (100i64 * (self.block_number as i64 + 1) / self.block_count as i64) as i32;
        if pct > self.progress_floor {
            self.progress_floor = pct;
            true
        } else {
            false
        }
    }

    /// Current progress as a percentage in `[0, 100]`.
    pub fn get_progress_marker(&self) -> f64 {
        if self.block_count <= 0 {
            return 0.0;
        }
        100.0 * (self.block_number as f64 + 1.0) / self.block_count as f64
    }

    /// Clear the buffer and mark this transfer terminal. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.data.clear();
        self.data.shrink_to_fit();
        self.released = true;
    }
}

/// `ceil(data_size / block_size)`, at least 1 for a non-empty blob.
pub fn block_count_for(data_size: i64, block_size: u32) -> i32 {
    let block_size = block_size as i64;
    (((data_size + block_size - 1) / block_size).max(0)) as i32
}

/// A queued send request awaiting its turn (§3 "ScheduledTransfer").
#[derive(Debug, Clone)]
pub struct ScheduledTransfer {
    /// Opaque UTF-8 routing hint.
    pub info: Vec<u8>,
    /// The full blob to send once admitted.
    pub data: Vec<u8>,
    /// Distinguishes concurrent attempts of the same `id`.
    pub nonce: u64,
    /// Application-assigned blob identifier.
    pub id: String,
}
