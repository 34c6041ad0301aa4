//! # Registered Callbacks
//!
//! The application-facing notification surface (§6 "Registered callbacks").
//! An embedder implements [`TransferCallbacks`] once and hands it to the
//! [`Scheduler`](crate::scheduler::Scheduler) at construction, rather than
//! wiring up four independent closures.

use crate::error::Error;
use crate::overlay::PeerId;

/// Where a transfer is in its lifecycle, as reported to
/// [`TransferCallbacks::on_receive_progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    /// Admitted but waiting for the peer to become free/reachable.
    Scheduled,
    /// The first block has arrived (receive side only).
    Initializing,
    /// Accumulating blocks, past the first progress marker.
    Downloading,
    /// Transfer complete.
    Finished,
}

/// A progress notification for one transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    /// Application-assigned blob identifier.
    pub id: String,
    /// Current lifecycle state.
    pub state: ProgressState,
    /// Percentage complete, in `[0, 100]`.
    pub progress: f64,
}

/// Notifications the scheduler delivers to the embedding application.
///
/// All methods have empty default bodies so an embedder only needs to
/// implement the ones it cares about.
pub trait TransferCallbacks: Send + Sync {
    /// A receive-side progress update (admission, first block, 5%
    /// increments, completion).
    fn on_receive_progress(&self, _peer: &PeerId, _info: &[u8], _progress: TransferProgress) {}

    /// An incoming transfer finished; `data` is the full, verified blob.
    fn on_receive_complete(&self, _peer: &PeerId, _info: &[u8], _id: &str, _data: Vec<u8>) {}

    /// An outgoing transfer finished; the embedder gets its `data` back
    /// (the sender is the source of truth, not a copy from the wire).
    fn on_send_complete(&self, _peer: &PeerId, _info: &[u8], _data: Vec<u8>, _nonce: u64) {}

    /// A transfer (either direction) terminated with an error.
    fn on_error(&self, _peer: &PeerId, _error: Error) {}
}

/// A [`TransferCallbacks`] that does nothing; useful as a placeholder or in
/// tests that only care about the packets an overlay double recorded.
#[derive(Debug, Default)]
pub struct NoopCallbacks;

impl TransferCallbacks for NoopCallbacks {}
