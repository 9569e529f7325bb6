use std::time::Duration;

/// Minimum spacing between two edits of the same status message.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

/// Age after which a status message is recreated instead of edited.
pub const DEFAULT_STALE_AFTER_SECS: i64 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
    pub debounce: Duration,
    pub stale_after: chrono::Duration,
}

impl StatusPolicy {
    pub fn new(debounce: Duration, stale_after: chrono::Duration) -> Self {
        Self {
            debounce,
            stale_after,
        }
    }

    pub fn from_config_values(debounce_ms: u64, stale_after_secs: u64) -> Option<Self> {
        let stale_after_secs = i64::try_from(stale_after_secs).ok()?;
        Some(Self {
            debounce: Duration::from_millis(debounce_ms),
            stale_after: chrono::Duration::try_seconds(stale_after_secs)?,
        })
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            stale_after: chrono::Duration::seconds(DEFAULT_STALE_AFTER_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_two_seconds_and_one_hour() {
        let policy = StatusPolicy::default();
        assert_eq!(policy.debounce, Duration::from_secs(2));
        assert_eq!(policy.stale_after, chrono::Duration::hours(1));
    }

    #[test]
    fn config_values_reject_out_of_range_staleness() {
        let policy = StatusPolicy::from_config_values(750, 90).expect("valid values");
        assert_eq!(policy.debounce, Duration::from_millis(750));
        assert_eq!(policy.stale_after, chrono::Duration::seconds(90));

        assert!(StatusPolicy::from_config_values(750, u64::MAX).is_none());
    }
}
