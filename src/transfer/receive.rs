//! # Receive Path
//!
//! The incoming transfer FSM (§4.3): admission of a write-request,
//! in-order accumulation of data blocks, periodic acknowledgement, and
//! completion.

use crate::callbacks::{ProgressState, TransferProgress};
use crate::error::Error;
use crate::overlay::PeerId;
use crate::protocol::{Acknowledgement, Data, ErrorPayload, Message, WriteRequest};
use crate::scheduler::Scheduler;
use crate::time::now_millis;
use crate::timer::TaskAction;
use crate::transfer::{Direction, Transfer};

impl Scheduler {
    fn send_error(&self, peer: &PeerId, id: &str, message: impl Into<String>) {
        self.encode_and_send(
            peer,
            &Message::Error(ErrorPayload { message: message.into(), info: id.to_string() }),
        );
    }

    /// Admit (or reject) an incoming write-request (§4.3 `on_write_request`).
    pub(crate) fn on_write_request(&mut self, peer: &PeerId, payload: WriteRequest) {
        if self.incoming.get(peer).is_some_and(|t| t.id == payload.id) {
            return;
        }
        if self.finished_incoming.get(peer).is_some_and(|set| set.contains(&payload.id)) {
            return;
        }

        if payload.data_size <= 0 {
            self.send_error(peer, &payload.id, "non-positive data_size");
            self.callbacks.on_error(peer, Error::ValueError { id: payload.id, data_size: payload.data_size });
            return;
        }
        if payload.data_size > self.config.binary_size_limit as i64 {
            self.send_error(peer, &payload.id, "data_size exceeds limit");
            self.callbacks.on_error(
                peer,
                Error::SizeError { id: payload.id, size: payload.data_size as u64, limit: self.config.binary_size_limit },
            );
            return;
        }
        if self.incoming.contains_key(peer) || self.outgoing.contains_key(peer) {
            self.send_error(peer, &payload.id, "peer already has an active transfer");
            self.callbacks.on_error(peer, Error::PeerBusy { id: payload.id });
            return;
        }

        let now = now_millis();
        let window_size = self.config.window_size_in_blocks as i32;
        let transfer = Transfer::new_incoming(
            peer.clone(),
            payload.id.clone(),
            payload.info,
            payload.nonce,
            payload.data_size,
            payload.block_count,
            window_size,
            now,
        );
        self.incoming.insert(peer.clone(), transfer);

        self.send_acknowledgement(peer);
        self.timers.schedule(
            now + self.config.timeout_interval_ms,
            TaskAction::TerminateByTimeout { peer: peer.clone(), direction: Direction::Incoming, id: payload.id.clone() },
        );
        self.timers.schedule(
            now + self.config.retransmit_interval_ms,
            TaskAction::AckRetransmit { peer: peer.clone(), id: payload.id },
        );
    }

    /// Accumulate one in-order data block (§4.3 `on_data`).
    pub(crate) fn on_data(&mut self, peer: &PeerId, payload: Data) {
        let Some(transfer) = self.incoming.get_mut(peer) else { return };
        if payload.nonce != transfer.nonce || payload.block_number != transfer.block_number + 1 {
            return;
        }

        transfer.block_number = payload.block_number;
        let marker = transfer.is_progress_marker();
        let info = transfer.info.clone();
        let id = transfer.id.clone();
        if marker {
            let state = if transfer.block_number == 0 { ProgressState::Initializing } else { ProgressState::Downloading };
            let progress = transfer.get_progress_marker();
            self.callbacks.on_receive_progress(peer, &info, TransferProgress { id: id.clone(), state, progress });
        }

        let transfer = self.incoming.get_mut(peer).expect("just looked up");
        transfer.data.extend_from_slice(&payload.data);

        if transfer.data.len() as u64 > self.config.binary_size_limit {
            let id = transfer.id.clone();
            self.send_error(peer, &id, "accumulated data exceeds limit");
            self.terminate(peer, Direction::Incoming);
            self.callbacks.on_error(
                peer,
                Error::SizeError { id, size: self.config.binary_size_limit + 1, limit: self.config.binary_size_limit },
            );
            return;
        }

        transfer.attempt = 0;
        transfer.updated = now_millis();

        let (block_number, block_count, acknowledgement_number, window_size) =
            (transfer.block_number, transfer.block_count, transfer.acknowledgement_number, transfer.window_size);

        if block_number == block_count - 1 {
            self.send_acknowledgement(peer);
            self.finish_incoming_transfer(peer);
        } else if acknowledgement_number + window_size <= block_number + 1 {
            self.send_acknowledgement(peer);
        }
    }

    /// Finalize a completed incoming transfer (§4.3 `finish_incoming_transfer`).
    fn finish_incoming_transfer(&mut self, peer: &PeerId) {
        let Some(mut transfer) = self.incoming.remove(peer) else { return };
        self.finished_incoming.entry(peer.clone()).or_default().insert(transfer.id.clone());
        let info = transfer.info.clone();
        let id = transfer.id.clone();
        self.callbacks.on_receive_progress(
            peer,
            &info,
            TransferProgress { id: id.clone(), state: ProgressState::Finished, progress: 100.0 },
        );
        let data = std::mem::take(&mut transfer.data);
        transfer.release();
        self.callbacks.on_receive_complete(peer, &info, &id, data);
    }

    /// Emit an acknowledgement for the current window state
    /// (§4.3 `send_acknowledgement`).
    pub(crate) fn send_acknowledgement(&mut self, peer: &PeerId) {
        let Some(transfer) = self.incoming.get_mut(peer) else { return };
        transfer.acknowledgement_number = transfer.block_number + 1;
        let ack = Message::Acknowledgement(Acknowledgement {
            number: transfer.acknowledgement_number,
            window_size: transfer.window_size,
            nonce: transfer.nonce,
        });
        self.encode_and_send(peer, &ack);
    }
}
