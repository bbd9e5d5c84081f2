//! Job status polling schedule

use std::time::Duration;

use bqstream_domain::constants::{
    POLL_FAST_DELAY_MS, POLL_MEDIUM_DELAY_MS, POLL_SLOW_DELAY_MS, POLL_TIER_LENGTH,
};

/// Delay before the next status check after `attempt` unfinished polls.
///
/// Attempts are 1-based: 1-4 wait 50ms, 5-8 wait 200ms, later ones 2s.
pub fn poll_delay(attempt: u32) -> Duration {
    let millis = match attempt.saturating_sub(1) / POLL_TIER_LENGTH {
        0 => POLL_FAST_DELAY_MS,
        1 => POLL_MEDIUM_DELAY_MS,
        _ => POLL_SLOW_DELAY_MS,
    };
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_steps_up_in_tiers() {
        let delays: Vec<u64> = (1..=10).map(|n| poll_delay(n).as_millis() as u64).collect();
        assert_eq!(delays, vec![50, 50, 50, 50, 200, 200, 200, 200, 2000, 2000]);
        assert_eq!(poll_delay(500), Duration::from_secs(2));
    }

    #[test]
    fn attempt_zero_is_fast() {
        assert_eq!(poll_delay(0), Duration::from_millis(50));
    }
}
