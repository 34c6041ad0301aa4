//! # Send Path
//!
//! The outgoing transfer FSM (§4.2): admission, write-request, windowed
//! transmission driven by incoming acknowledgements, and completion.

use crate::error::Error;
use crate::overlay::PeerId;
use crate::protocol::{Message, WriteRequest};
use crate::scheduler::Scheduler;
use crate::time::now_millis;
use crate::timer::TaskAction;
use crate::transfer::{Direction, ScheduledTransfer, Transfer};

impl Scheduler {
    /// Admit a new outgoing blob transfer (§4.2 `send_binary`).
    ///
    /// Silently does nothing if `info`, `id`, or `data` is empty, if `peer`
    /// is this scheduler's own identity, or if `id` is already scheduled,
    /// already outgoing, or already finished-outgoing for `peer`. `nonce`
    /// defaults to a uniform random `u64` when absent (§9: the full 64-bit
    /// range is used, not the source's narrower one).
    pub fn send_binary(
        &mut self,
        peer: PeerId,
        info: Vec<u8>,
        id: String,
        data: Vec<u8>,
        nonce: Option<u64>,
    ) {
        if info.is_empty() || id.is_empty() || data.is_empty() || peer == self.my_peer_id {
            return;
        }
        if self.already_outgoing(&peer, &id) {
            return;
        }

        let nonce = nonce.unwrap_or_else(rand::random::<u64>);

        if !self.is_admissible(&peer) {
            self.enqueue_scheduled(peer, info, data, nonce, id);
            return;
        }
        self.start_outgoing_transfer(&peer, info, data, nonce, id);
    }

    fn already_outgoing(&self, peer: &PeerId, id: &str) -> bool {
        if self.scheduled.get(peer).is_some_and(|q| q.iter().any(|s| s.id == id)) {
            return true;
        }
        if self.outgoing.get(peer).is_some_and(|t| t.id == id) {
            return true;
        }
        self.finished_outgoing.get(peer).is_some_and(|set| set.contains(id))
    }

    fn enqueue_scheduled(&mut self, peer: PeerId, info: Vec<u8>, data: Vec<u8>, nonce: u64, id: String) {
        use crate::callbacks::{ProgressState, TransferProgress};

        self.callbacks.on_receive_progress(
            &peer,
            &info,
            TransferProgress { id: id.clone(), state: ProgressState::Scheduled, progress: 0.0 },
        );
        self.scheduled
            .entry(peer)
            .or_default()
            .push_back(ScheduledTransfer { info, data, nonce, id });
    }

    /// Re-verify admission and either start transmitting or re-enqueue
    /// (§4.2 `start_outgoing_transfer`).
    pub(crate) fn start_outgoing_transfer(
        &mut self,
        peer: &PeerId,
        info: Vec<u8>,
        data: Vec<u8>,
        nonce: u64,
        id: String,
    ) {
        if !self.is_admissible(peer) {
            self.enqueue_scheduled(peer.clone(), info, data, nonce, id);
            return;
        }

        let data_size = data.len() as i64;
        if data_size > self.config.binary_size_limit as i64 {
            self.callbacks.on_error(
                peer,
                Error::SizeError { id, size: data_size.max(0) as u64, limit: self.config.binary_size_limit },
            );
            return;
        }

        let now = now_millis();
        let transfer = Transfer::new_outgoing(
            peer.clone(),
            id.clone(),
            info,
            nonce,
            data,
            self.config.block_size,
            now,
        );
        let block_count = transfer.block_count;
        let info = transfer.info.clone();
        self.outgoing.insert(peer.clone(), transfer);
        self.timers.schedule(
            now + self.config.timeout_interval_ms,
            TaskAction::TerminateByTimeout { peer: peer.clone(), direction: Direction::Outgoing, id: id.clone() },
        );

        let request = Message::WriteRequest(WriteRequest { data_size, block_count, nonce, id, info });
        self.encode_and_send(peer, &request);
    }

    /// Apply an acknowledgement, advancing the window and transmitting the
    /// next batch of data blocks, or finishing the flow (§4.2).
    pub(crate) fn on_acknowledgement(&mut self, peer: &PeerId, payload: crate::protocol::Acknowledgement) {
        let Some(transfer) = self.outgoing.get_mut(peer) else { return };
        if payload.nonce != transfer.nonce || payload.number < transfer.block_number {
            return;
        }

        transfer.block_number = payload.number;

        if transfer.block_number > transfer.block_count - 1 {
            self.finish_outgoing_transfer(peer);
            return;
        }

        let window = self.config.clamp_window(payload.window_size.max(0) as u32) as i32;
        let (block_number, block_count, block_size, nonce, data_size) = {
            let transfer = self.outgoing.get_mut(peer).expect("just looked up");
            transfer.window_size = window;
            transfer.updated = now_millis();
            (transfer.block_number, transfer.block_count, self.config.block_size as i64, transfer.nonce, transfer.data_size)
        };

        let upper = (block_number + window).min(block_count);
        for index in block_number..upper {
            let start = (index as i64 * block_size) as usize;
            let end = (((index as i64 + 1) * block_size).min(data_size)) as usize;
            let block = self.outgoing.get(peer).expect("just looked up").data[start..end].to_vec();
            let data_msg = Message::Data(crate::protocol::Data { block_number: index, nonce, data: block });
            self.encode_and_send(peer, &data_msg);
        }
    }

    /// Finalize a completed outgoing transfer (§4.2 `finish_outgoing_transfer`).
    fn finish_outgoing_transfer(&mut self, peer: &PeerId) {
        let Some(mut transfer) = self.outgoing.remove(peer) else { return };
        self.finished_outgoing.entry(peer.clone()).or_default().insert(transfer.id.clone());
        transfer.release();
        self.callbacks.on_send_complete(peer, &transfer.info, transfer.data, transfer.nonce);
        self.send_scheduled();
    }

    /// A remote error arrived for our outgoing flow (§4.3 `on_error`).
    ///
    /// Looked up by `peer` alone, not by matching `payload.info` against the
    /// transfer id: §6 defines the error payload as `message` plus `info`
    /// with no contract that `info` echoes the flow id, so requiring a match
    /// would silently drop genuine remote errors and leave the flow to stall
    /// to timeout instead of terminating (see DESIGN.md).
    pub(crate) fn on_remote_error(&mut self, peer: &PeerId, payload: crate::protocol::ErrorPayload) {
        let Some(transfer) = self.outgoing.get(peer) else { return };
        let id = transfer.id.clone();
        self.outgoing.remove(peer).map(|mut t| t.release());
        self.callbacks.on_error(peer, Error::Remote { id, message: payload.message });
        self.send_scheduled();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::NoopCallbacks;
    use crate::config::TransferConfig;
    use crate::overlay::test_support::RecordingOverlay;
    use crate::protocol::{Acknowledgement, Message};
    use crate::scheduler::Scheduler;
    use std::sync::Arc;

    fn scheduler_with(overlay: Arc<RecordingOverlay>) -> Scheduler {
        Scheduler::new(PeerId::new("me"), TransferConfig::default(), overlay, Arc::new(NoopCallbacks)).unwrap()
    }

    #[test]
    fn send_binary_ignores_empty_arguments() {
        let overlay = Arc::new(RecordingOverlay::new());
        let peer = PeerId::new("b");
        overlay.connect(peer.clone());
        let mut s = scheduler_with(overlay.clone());

        s.send_binary(peer.clone(), vec![], "x".into(), vec![1], None);
        s.send_binary(peer.clone(), vec![1], "".into(), vec![1], None);
        s.send_binary(peer.clone(), vec![1], "x".into(), vec![], None);
        assert!(overlay.sent().is_empty());
        assert!(s.outgoing.is_empty());
    }

    #[test]
    fn send_binary_ignores_self_send() {
        let overlay = Arc::new(RecordingOverlay::new());
        let me = PeerId::new("me");
        overlay.connect(me.clone());
        let mut s = scheduler_with(overlay.clone());

        s.send_binary(me.clone(), b"app".to_vec(), "x".into(), b"hello".to_vec(), None);
        assert!(overlay.sent().is_empty());
        assert!(s.outgoing.is_empty());
        assert!(s.scheduled.get(&me).is_none());
    }

    #[test]
    fn send_binary_enqueues_when_peer_unreachable() {
        let overlay = Arc::new(RecordingOverlay::new());
        let peer = PeerId::new("b");
        let mut s = scheduler_with(overlay.clone());

        s.send_binary(peer.clone(), b"app".to_vec(), "x".into(), b"hello".to_vec(), None);
        assert!(overlay.sent().is_empty());
        assert_eq!(s.scheduled.get(&peer).map(|q| q.len()), Some(1));
    }

    #[test]
    fn send_binary_emits_write_request_when_admissible() {
        let overlay = Arc::new(RecordingOverlay::new());
        let peer = PeerId::new("b");
        overlay.connect(peer.clone());
        let mut s = scheduler_with(overlay.clone());

        s.send_binary(peer.clone(), b"app".to_vec(), "x".into(), b"ABCDEFGHIJKLMNO".to_vec(), Some(42));
        let sent = overlay.sent();
        assert_eq!(sent.len(), 1);
        let Message::WriteRequest(req) = Message::decode(&sent[0].1).unwrap() else {
            panic!("expected write-request")
        };
        assert_eq!(req.data_size, 15);
        assert_eq!(req.nonce, 42);
        assert!(s.outgoing.contains_key(&peer));
    }

    #[test]
    fn oversized_send_fires_error_without_transfer() {
        let overlay = Arc::new(RecordingOverlay::new());
        let peer = PeerId::new("b");
        overlay.connect(peer.clone());
        let mut s = Scheduler::new(
            PeerId::new("me"),
            crate::config::TransferConfig { binary_size_limit: 4, ..Default::default() },
            overlay.clone(),
            Arc::new(NoopCallbacks),
        )
        .unwrap();

        s.send_binary(peer.clone(), b"app".to_vec(), "x".into(), b"too big".to_vec(), None);
        assert!(overlay.sent().is_empty());
        assert!(s.outgoing.is_empty());
    }

    #[test]
    fn acknowledgement_drives_windowed_transmission() {
        let overlay = Arc::new(RecordingOverlay::new());
        let peer = PeerId::new("b");
        overlay.connect(peer.clone());
        let mut s = Scheduler::new(
            PeerId::new("me"),
            crate::config::TransferConfig { block_size: 10, ..Default::default() },
            overlay.clone(),
            Arc::new(NoopCallbacks),
        )
        .unwrap();

        s.send_binary(peer.clone(), b"app".to_vec(), "x".into(), b"ABCDEFGHIJKLMNO".to_vec(), Some(1));
        overlay.clear_sent();

        s.on_acknowledgement(&peer, Acknowledgement { number: 0, window_size: 64, nonce: 1 });
        let sent = overlay.sent();
        assert_eq!(sent.len(), 2);

        overlay.clear_sent();
        s.on_acknowledgement(&peer, Acknowledgement { number: 2, window_size: 64, nonce: 1 });
        assert!(overlay.sent().is_empty());
        assert!(!s.outgoing.contains_key(&peer));
        assert!(s.finished_outgoing.get(&peer).unwrap().contains("x"));
    }

    #[test]
    fn stale_acknowledgement_is_ignored() {
        let overlay = Arc::new(RecordingOverlay::new());
        let peer = PeerId::new("b");
        overlay.connect(peer.clone());
        let mut s = Scheduler::new(
            PeerId::new("me"),
            crate::config::TransferConfig { block_size: 10, ..Default::default() },
            overlay.clone(),
            Arc::new(NoopCallbacks),
        )
        .unwrap();
        s.send_binary(peer.clone(), b"app".to_vec(), "x".into(), b"ABCDEFGHIJKLMNO".to_vec(), Some(1));
        s.on_acknowledgement(&peer, Acknowledgement { number: 1, window_size: 64, nonce: 1 });
        overlay.clear_sent();

        s.on_acknowledgement(&peer, Acknowledgement { number: 0, window_size: 64, nonce: 1 });
        assert!(overlay.sent().is_empty());
    }
}
