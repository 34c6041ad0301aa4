//! # Configuration
//!
//! Constructor-time options recognized by the scheduler (§6). All values
//! are validated once, at construction, rather than defensively re-checked
//! on every use.

use crate::error::{Error, Result};

/// Minimum window size in blocks, regardless of what a peer advertises.
pub const MIN_WINDOW: u32 = 1;

/// Default block size in bytes.
pub const DEFAULT_BLOCK_SIZE: u32 = 1000;

/// Default initial receive window, in blocks.
pub const DEFAULT_WINDOW_SIZE_IN_BLOCKS: u32 = 64;

/// Default acknowledgement retransmit period.
pub const DEFAULT_RETRANSMIT_INTERVAL_MS: i64 = 3_000;

/// Default maximum number of acknowledgement retransmits.
pub const DEFAULT_RETRANSMIT_ATTEMPT_COUNT: u32 = 3;

/// Default scheduler pump period.
pub const DEFAULT_SCHEDULED_SEND_INTERVAL_MS: i64 = 5_000;

/// Default inactivity timeout before a transfer is terminated.
pub const DEFAULT_TIMEOUT_INTERVAL_MS: i64 = 20_000;

/// Default maximum blob size: 1 GiB.
pub const DEFAULT_BINARY_SIZE_LIMIT: u64 = 1024 * 1024 * 1024;

/// Tunables recognized by the scheduler.
///
/// Mirrors the option table in §6. Construct with [`TransferConfig::default`]
/// and override individual fields, then call [`TransferConfig::validate`]
/// (the scheduler does this for you on construction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Bytes per data block.
    pub block_size: u32,
    /// Initial receive window, in blocks.
    pub window_size_in_blocks: u32,
    /// Acknowledgement retransmit period, in milliseconds.
    pub retransmit_interval_ms: i64,
    /// Maximum number of acknowledgement retransmits before giving up.
    pub retransmit_attempt_count: u32,
    /// Scheduler pump period, in milliseconds.
    pub scheduled_send_interval_ms: i64,
    /// Inactivity timeout before a transfer is terminated, in milliseconds.
    pub timeout_interval_ms: i64,
    /// Maximum blob size, in bytes.
    pub binary_size_limit: u64,
    /// Whether the terminate-by-timeout timer (§4.5) is active.
    pub terminate_by_timeout_enabled: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            window_size_in_blocks: DEFAULT_WINDOW_SIZE_IN_BLOCKS,
            retransmit_interval_ms: DEFAULT_RETRANSMIT_INTERVAL_MS,
            retransmit_attempt_count: DEFAULT_RETRANSMIT_ATTEMPT_COUNT,
            scheduled_send_interval_ms: DEFAULT_SCHEDULED_SEND_INTERVAL_MS,
            timeout_interval_ms: DEFAULT_TIMEOUT_INTERVAL_MS,
            binary_size_limit: DEFAULT_BINARY_SIZE_LIMIT,
            terminate_by_timeout_enabled: true,
        }
    }
}

impl TransferConfig {
    /// Reject configurations that would make the protocol ill-defined.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(Error::InvalidConfig("block_size must be > 0".into()));
        }
        if self.binary_size_limit == 0 {
            return Err(Error::InvalidConfig("binary_size_limit must be > 0".into()));
        }
        if self.window_size_in_blocks < MIN_WINDOW {
            return Err(Error::InvalidConfig(format!(
                "window_size_in_blocks must be >= {MIN_WINDOW}"
            )));
        }
        if self.retransmit_interval_ms <= 0 {
            return Err(Error::InvalidConfig("retransmit_interval_ms must be > 0".into()));
        }
        if self.scheduled_send_interval_ms <= 0 {
            return Err(Error::InvalidConfig(
                "scheduled_send_interval_ms must be > 0".into(),
            ));
        }
        if self.timeout_interval_ms <= 0 {
            return Err(Error::InvalidConfig("timeout_interval_ms must be > 0".into()));
        }
        Ok(())
    }

    /// Clamp a peer-advertised window size into `[MIN_WINDOW, binary_size_limit]`,
    /// per the §3 invariant on `window_size`.
    pub fn clamp_window(&self, window_size: u32) -> u32 {
        let upper = self.binary_size_limit.min(u32::MAX as u64) as u32;
        window_size.clamp(MIN_WINDOW, upper.max(MIN_WINDOW))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(TransferConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_binary_size_limit() {
        let cfg = TransferConfig { binary_size_limit: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_window_below_minimum() {
        let cfg = TransferConfig { window_size_in_blocks: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn clamp_window_respects_bounds() {
        let cfg = TransferConfig::default();
        assert_eq!(cfg.clamp_window(0), MIN_WINDOW);
        assert_eq!(cfg.clamp_window(128), 128);
    }
}
