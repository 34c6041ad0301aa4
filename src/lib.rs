//! # Overlay Transfer
//!
//! A reliable, windowed, block-oriented binary transfer protocol layered
//! atop an unreliable, datagram-oriented peer-to-peer overlay.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      OVERLAY TRANSFER MODULES                          │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │  Transfer   │  │    Send     │  │   Receive   │  │  Scheduler   │   │
//! │  │             │  │    Path     │  │    Path     │  │              │   │
//! │  │ - Record    │  │ - send_     │  │ - write_    │  │ - per-peer   │   │
//! │  │ - Progress  │  │   binary    │  │   request   │  │   queue      │   │
//! │  │ - Release   │  │ - ack/data  │  │ - data/ack  │  │ - dispatch   │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴────────────────┴────────────────┘           │
//! │                                   │                                     │
//! │  ┌─────────────┐  ┌─────────────┐ │ ┌─────────────────────────────────┐│
//! │  │    Timer    │  │  Protocol   │ │ │            Overlay              ││
//! │  │  Subsystem  │  │    Codec    │ │ │                                 ││
//! │  │             │  │             │◄┘ │ - opaque PeerId                ││
//! │  │ - min-heap  │  │ - bincode   │   │ - reachability                 ││
//! │  │ - timeout   │  │ - 4 message │   │ - fire-and-forget send         ││
//! │  │ - retransmit│  │   kinds     │   │                                 ││
//! │  └─────────────┘  └─────────────┘   └─────────────────────────────────┘│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error taxonomy for the whole crate
//! - [`config`] - Constructor-time options and their defaults
//! - [`overlay`] - The external transport contract this crate consumes
//! - [`protocol`] - Wire message types and their codec
//! - [`transfer`] - The per-flow state record plus the send/receive FSMs
//! - [`scheduler`] - Owns every transfer, the per-peer queues, and the
//!   timer heap; drives the single-threaded dispatcher loop
//! - [`timer`] - The delayed-action min-heap behind timeout and retransmit
//! - [`callbacks`] - The application-facing notification trait
//! - [`time`] - Wall-clock helpers
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        DISPATCHER LOOP                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  A single task owns the Scheduler and selects over three sources:      │
//! │                                                                         │
//! │  1. Inbound packets (from the overlay, via an mpsc channel)            │
//! │     ──► decode ──► dispatch to the matching FSM handler                │
//! │                                                                         │
//! │  2. Scheduler pump (every scheduled_send_interval)                     │
//! │     ──► promote one queued transfer per idle, reachable peer           │
//! │                                                                         │
//! │  3. Timer poll (every 1s)                                              │
//! │     ──► drain due tasks: timeouts, ack retransmits, the pump itself    │
//! │                                                                         │
//! │  No transfer state is ever touched from more than one task.            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod callbacks;
pub mod config;
pub mod error;
pub mod overlay;
pub mod protocol;
pub mod scheduler;
/// Platform-aware wall-clock helpers.
pub mod time;
pub mod timer;
pub mod transfer;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use callbacks::{ProgressState, TransferCallbacks, TransferProgress};
pub use config::TransferConfig;
pub use error::{Error, Result};
pub use overlay::{Overlay, Peer, PeerId};
pub use scheduler::{Inbound, Scheduler};
pub use transfer::{Direction, Transfer};

/// Returns the version of this crate.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
