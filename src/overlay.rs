//! # Overlay Contract
//!
//! The narrow boundary between this crate and the real peer-to-peer
//! transport (out of scope per §1: address resolution, signing, peer
//! discovery, and NAT traversal all live on the other side of this trait).
//! The core consumes opaque peer identifiers and never inspects them.

use std::fmt;

/// Opaque identity of a remote peer, as assigned by the overlay.
///
/// Cheap to clone and hash; the core only ever compares these for equality
/// and uses them as map keys, never interprets their contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(String);

impl PeerId {
    /// Wrap an overlay-assigned opaque key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the opaque key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A reachable peer, as reported by `Overlay::peers`.
///
/// `key` and `address` are both opaque from the core's perspective — they
/// exist purely so an embedder's `Overlay` implementation can carry
/// whatever it needs to actually route a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// The peer's identity.
    pub id: PeerId,
    /// Opaque address/route hint (overlay-specific; unused by the core).
    pub address: String,
}

/// The external collaborator contract (§6 "Overlay contract").
///
/// Implementations are expected to be cheap to call and non-blocking —
/// `send` in particular is fire-and-forget: the core provides no flow
/// control toward the transport and does not retry a failed send itself
/// (retransmission here means re-sending *protocol* packets like
/// acknowledgements, which is a decision the scheduler makes, not a
/// transport-level retry).
pub trait Overlay: Send + Sync {
    /// Currently reachable peers.
    fn peers(&self) -> Vec<Peer>;

    /// Whether `peer` is currently reachable. The default implementation
    /// scans `peers()`; implementations backed by a fast lookup table
    /// should override this.
    fn is_reachable(&self, peer: &PeerId) -> bool {
        self.peers().iter().any(|p| &p.id == peer)
    }

    /// Fire-and-forget emission of an already-encoded packet.
    fn send(&self, peer: &PeerId, packet: Vec<u8>);
}

#[cfg(test)]
pub mod test_support {
    //! An in-memory `Overlay` double, so protocol tests never need real
    //! sockets (§8, ambient testable property 9).
    use super::*;
    use std::sync::Mutex;

    /// Records every packet handed to `send`, keyed by recipient.
    #[derive(Default)]
    pub struct RecordingOverlay {
        reachable: Mutex<Vec<Peer>>,
        sent: Mutex<Vec<(PeerId, Vec<u8>)>>,
    }

    impl RecordingOverlay {
        /// Create a double with no reachable peers.
        pub fn new() -> Self {
            Self::default()
        }

        /// Mark a peer as currently reachable.
        pub fn connect(&self, peer: PeerId) {
            self.reachable.lock().unwrap().push(Peer {
                id: peer,
                address: "test".into(),
            });
        }

        /// Mark a peer as no longer reachable.
        pub fn disconnect(&self, peer: &PeerId) {
            self.reachable.lock().unwrap().retain(|p| &p.id != peer);
        }

        /// All packets sent so far, in order.
        pub fn sent(&self) -> Vec<(PeerId, Vec<u8>)> {
            self.sent.lock().unwrap().clone()
        }

        /// Clear recorded packets without touching reachability.
        pub fn clear_sent(&self) {
            self.sent.lock().unwrap().clear();
        }
    }

    impl Overlay for RecordingOverlay {
        fn peers(&self) -> Vec<Peer> {
            self.reachable.lock().unwrap().clone()
        }

        fn send(&self, peer: &PeerId, packet: Vec<u8>) {
            self.sent.lock().unwrap().push((peer.clone(), packet));
        }
    }

    #[test]
    fn recording_overlay_tracks_reachability_and_sends() {
        let overlay = RecordingOverlay::new();
        let peer = PeerId::new("peer-a");
        assert!(!overlay.is_reachable(&peer));

        overlay.connect(peer.clone());
        assert!(overlay.is_reachable(&peer));

        overlay.send(&peer, vec![1, 2, 3]);
        assert_eq!(overlay.sent(), vec![(peer.clone(), vec![1, 2, 3])]);

        overlay.disconnect(&peer);
        assert!(!overlay.is_reachable(&peer));
    }
}
