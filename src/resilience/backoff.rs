//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Delay before retrying after the given (1-based) failed attempt
///
/// `base * 2^(attempt - 1)`, capped at `max`, then reduced by up to 10% of
/// jitter so concurrent callers do not retry in lockstep. Never exceeds `max`.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);

    let exponential = 2u64.saturating_pow(attempt - 1);
    let capped_ms = base_ms.saturating_mul(exponential).min(max_ms);

    let jitter_range = capped_ms / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..=jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_ms - jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let base = Duration::from_millis(100);
        let max = Duration::from_millis(10_000);

        let first = calculate_backoff(1, base, max);
        assert!(first >= Duration::from_millis(90) && first <= Duration::from_millis(100));

        let second = calculate_backoff(2, base, max);
        assert!(second >= Duration::from_millis(180) && second <= Duration::from_millis(200));

        let third = calculate_backoff(3, base, max);
        assert!(third >= Duration::from_millis(360) && third <= Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_is_capped() {
        let capped = calculate_backoff(20, Duration::from_millis(100), Duration::from_millis(1_000));
        assert!(capped <= Duration::from_millis(1_000));
        assert!(capped >= Duration::from_millis(900));
    }

    #[test]
    fn test_backoff_survives_huge_attempts() {
        let delay = calculate_backoff(u32::MAX, Duration::from_secs(1), Duration::from_secs(30));
        assert!(delay <= Duration::from_secs(30));
    }

    #[test]
    fn test_attempt_zero_has_no_delay() {
        assert_eq!(
            calculate_backoff(0, Duration::from_millis(100), Duration::from_secs(1)),
            Duration::ZERO
        );
    }
}
