//! # Scheduler
//!
//! Owns every transfer record, the per-peer scheduling queues, the
//! finished-id sets, and the timer heap (§4.4, §9 "global mutable state").
//! Deliberately an explicit, caller-constructed instance rather than a
//! process-wide singleton: an embedder owns one `Scheduler` per overlay
//! connection and drives it from [`Scheduler::run`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::callbacks::TransferCallbacks;
use crate::config::TransferConfig;
use crate::error::{Error, Result};
use crate::overlay::{Overlay, PeerId};
use crate::protocol::Message;
use crate::timer::{TaskAction, TimerQueue};
use crate::time::now_millis;
use crate::transfer::{Direction, ScheduledTransfer, Transfer};

/// Coordinates every active and queued transfer across all peers.
///
/// Not `Clone`; an embedder typically wraps it in `Arc<Mutex<_>>` or, to
/// honor the single-threaded cooperative model of §5, drives it exclusively
/// from the task spawned by [`Scheduler::run`] and talks to it only via the
/// inbound channel that feeds that task.
pub struct Scheduler {
    pub(crate) my_peer_id: PeerId,
    pub(crate) outgoing: HashMap<PeerId, Transfer>,
    pub(crate) incoming: HashMap<PeerId, Transfer>,
    pub(crate) scheduled: HashMap<PeerId, VecDeque<ScheduledTransfer>>,
    pub(crate) finished_outgoing: HashMap<PeerId, HashSet<String>>,
    pub(crate) finished_incoming: HashMap<PeerId, HashSet<String>>,
    pub(crate) timers: TimerQueue,
    pub(crate) config: TransferConfig,
    pub(crate) overlay: Arc<dyn Overlay>,
    pub(crate) callbacks: Arc<dyn TransferCallbacks>,
}

/// A packet that arrived from the overlay, addressed to the dispatcher.
#[derive(Debug, Clone)]
pub struct Inbound {
    /// Who sent it.
    pub peer: PeerId,
    /// The raw, still-encoded packet.
    pub packet: Vec<u8>,
}

impl Scheduler {
    /// Build a scheduler. Returns an error if `config` is invalid.
    ///
    /// `my_peer_id` is this process's own identity, as assigned by the
    /// overlay (the teacher's ipv8-style core carries the analogous
    /// `myPeer` on its community object) — it's the value `send_binary`
    /// compares the target `peer` against to silently reject a self-send
    /// per §4.2.
    pub fn new(
        my_peer_id: PeerId,
        config: TransferConfig,
        overlay: Arc<dyn Overlay>,
        callbacks: Arc<dyn TransferCallbacks>,
    ) -> Result<Self> {
        config.validate()?;
        let mut timers = TimerQueue::new();
        timers.schedule(
            now_millis() + config.scheduled_send_interval_ms,
            TaskAction::SchedulerTick,
        );
        Ok(Self {
            my_peer_id,
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            scheduled: HashMap::new(),
            finished_outgoing: HashMap::new(),
            finished_incoming: HashMap::new(),
            timers,
            config,
            overlay,
            callbacks,
        })
    }

    pub(crate) fn encode_and_send(&self, peer: &PeerId, message: &Message) {
        match message.encode() {
            Ok(bytes) => self.overlay.send(peer, bytes),
            Err(err) => warn!(%peer, error = %err, "failed to encode outgoing packet"),
        }
    }

    pub(crate) fn is_admissible(&self, peer: &PeerId) -> bool {
        !self.outgoing.contains_key(peer)
            && !self.incoming.contains_key(peer)
            && self.overlay.is_reachable(peer)
    }

    pub(crate) fn terminate(&mut self, peer: &PeerId, direction: Direction) -> Option<Transfer> {
        let mut transfer = match direction {
            Direction::Outgoing => self.outgoing.remove(peer),
            Direction::Incoming => self.incoming.remove(peer),
        }?;
        transfer.release();
        Some(transfer)
    }

    /// Dispatch a single decoded, already-routed inbound message.
    pub(crate) fn dispatch(&mut self, peer: &PeerId, message: Message) {
        match message {
            Message::WriteRequest(payload) => self.on_write_request(peer, payload),
            Message::Acknowledgement(payload) => self.on_acknowledgement(peer, payload),
            Message::Data(payload) => self.on_data(peer, payload),
            Message::Error(payload) => self.on_remote_error(peer, payload),
        }
    }

    /// Decode and dispatch one raw packet from `peer`.
    ///
    /// This is the synchronous counterpart to [`Scheduler::run`]'s inbound
    /// channel handling: an embedder that doesn't want to hand the
    /// `Scheduler` over to a `tokio` task (§9 "a dedicated OS thread with a
    /// condition variable" is an acceptable alternative to the async
    /// dispatcher) can drive packet handling, `send_scheduled`, and
    /// `poll_timers` manually from its own loop instead.
    pub fn receive_packet(&mut self, peer: &PeerId, packet: &[u8]) {
        match Message::decode(packet) {
            Ok(message) => self.dispatch(peer, message),
            Err(err) => warn!(%peer, error = %err, "dropping undecodable packet"),
        }
    }

    /// Pump every peer with a non-empty scheduled queue and no active
    /// outgoing transfer (§4.4 `send_scheduled`).
    pub fn send_scheduled(&mut self) {
        let candidates: Vec<PeerId> = self
            .scheduled
            .iter()
            .filter(|(_, q)| !q.is_empty())
            .map(|(peer, _)| peer.clone())
            .collect();

        for peer in candidates {
            if self.outgoing.contains_key(&peer) || !self.overlay.is_reachable(&peer) {
                continue;
            }
            let Some(queue) = self.scheduled.get_mut(&peer) else { continue };
            let Some(item) = queue.pop_front() else { continue };
            self.start_outgoing_transfer(&peer, item.info, item.data, item.nonce, item.id);
        }
    }

    /// Process every timer task currently due, acting on each in order.
    pub fn poll_timers(&mut self, now: i64) {
        for task in self.timers.drain_due(now) {
            match task.action {
                TaskAction::SchedulerTick => {
                    self.send_scheduled();
                    self.timers.schedule(
                        now + self.config.scheduled_send_interval_ms,
                        TaskAction::SchedulerTick,
                    );
                }
                TaskAction::TerminateByTimeout { peer, direction, id } => {
                    self.on_terminate_by_timeout(peer, direction, id, now);
                }
                TaskAction::AckRetransmit { peer, id } => {
                    self.on_ack_retransmit(peer, id, now);
                }
            }
        }
    }

    fn on_terminate_by_timeout(&mut self, peer: PeerId, direction: Direction, id: String, now: i64) {
        if !self.config.terminate_by_timeout_enabled {
            return;
        }
        let active = match direction {
            Direction::Outgoing => self.outgoing.get(&peer),
            Direction::Incoming => self.incoming.get(&peer),
        };
        let Some(transfer) = active else { return };
        if transfer.released || transfer.id != id {
            return;
        }
        let remaining = self.config.timeout_interval_ms - (now - transfer.updated);
        if remaining > 0 {
            self.timers.schedule(
                now + remaining,
                TaskAction::TerminateByTimeout { peer, direction, id },
            );
            return;
        }
        let elapsed_ms = now - transfer.updated;
        self.terminate(&peer, direction);
        self.callbacks.on_error(&peer, Error::Timeout { id, elapsed_ms });
        if direction == Direction::Outgoing {
            self.send_scheduled();
        }
    }

    fn on_ack_retransmit(&mut self, peer: PeerId, id: String, now: i64) {
        let Some(transfer) = self.incoming.get_mut(&peer) else { return };
        if transfer.released || transfer.id != id {
            return;
        }
        if transfer.attempt >= self.config.retransmit_attempt_count.saturating_sub(1) {
            debug!(%peer, %id, "ack retransmit attempts exhausted");
            return;
        }
        if now - transfer.updated >= self.config.retransmit_interval_ms {
            transfer.attempt += 1;
            self.send_acknowledgement(&peer);
        }
        self.timers.schedule(
            now + self.config.retransmit_interval_ms,
            TaskAction::AckRetransmit { peer, id },
        );
    }

    /// Run the dispatcher loop (§5): a single task serializing inbound
    /// packets, the scheduler pump, and the timer poll. Returns when
    /// `inbound` is closed.
    pub async fn run(mut self, mut inbound: tokio::sync::mpsc::Receiver<Inbound>) {
        let mut pump = tokio::time::interval(Duration::from_millis(
            self.config.scheduled_send_interval_ms.max(1) as u64,
        ));
        let mut ticks = tokio::time::interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                maybe_msg = inbound.recv() => {
                    match maybe_msg {
                        Some(Inbound { peer, packet }) => self.receive_packet(&peer, &packet),
                        None => {
                            debug!("inbound channel closed, stopping dispatcher");
                            return;
                        }
                    }
                }
                _ = pump.tick() => {
                    self.send_scheduled();
                }
                _ = ticks.tick() => {
                    self.poll_timers(now_millis());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::NoopCallbacks;
    use crate::overlay::test_support::RecordingOverlay;

    fn scheduler(overlay: Arc<RecordingOverlay>) -> Scheduler {
        Scheduler::new(PeerId::new("me"), TransferConfig::default(), overlay, Arc::new(NoopCallbacks)).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let overlay = Arc::new(RecordingOverlay::new());
        let bad = TransferConfig { block_size: 0, ..Default::default() };
        assert!(Scheduler::new(PeerId::new("me"), bad, overlay, Arc::new(NoopCallbacks)).is_err());
    }

    #[test]
    fn fresh_scheduler_has_no_active_transfers() {
        let overlay = Arc::new(RecordingOverlay::new());
        let s = scheduler(overlay);
        assert!(s.outgoing.is_empty());
        assert!(s.incoming.is_empty());
        assert_eq!(s.timers.len(), 1); // the initial scheduler tick
    }

    #[test]
    fn receive_packet_drops_undecodable_bytes_without_panicking() {
        let overlay = Arc::new(RecordingOverlay::new());
        let mut s = scheduler(overlay);
        let peer = PeerId::new("a");
        s.receive_packet(&peer, &[0xff, 0x00, 0x01]);
        assert!(s.incoming.is_empty());
        assert!(s.outgoing.is_empty());
    }

    #[test]
    fn receive_packet_routes_write_request_to_incoming() {
        use crate::protocol::{Message, WriteRequest};

        let overlay = Arc::new(RecordingOverlay::new());
        let mut s = scheduler(overlay);
        let peer = PeerId::new("a");
        let packet = Message::WriteRequest(WriteRequest {
            data_size: 15,
            block_count: 2,
            nonce: 1,
            id: "x".into(),
            info: b"app".to_vec(),
        })
        .encode()
        .unwrap();

        s.receive_packet(&peer, &packet);
        assert!(s.incoming.contains_key(&peer));
    }
}
