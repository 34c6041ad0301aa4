//! Wall-clock helpers.
//!
//! `updated` and `ScheduledTask::at_time` are both "milliseconds since
//! epoch" per §3/§4.5; everything in this crate reads the clock through
//! here so tests can reason about it without depending on `chrono` directly.

/// Returns the current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_millis_is_reasonable() {
        let ts = now_millis();
        // After 2024-01-01.
        assert!(ts > 1_704_067_200_000, "timestamp {} is too old", ts);
        // Before 2100-01-01.
        assert!(ts < 4_102_444_800_000, "timestamp {} is too far in the future", ts);
    }
}
