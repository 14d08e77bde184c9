use crate::types::SessionStatus;
use std::time::Duration;

pub const DEFAULT_REFRESH_INTERVAL_SECONDS: u64 = 300;
pub const MIN_REFRESH_INTERVAL_SECONDS: u64 = 30;

pub(crate) fn refresh_interval(configured_seconds: u64) -> Duration {
    Duration::from_secs(configured_seconds.max(MIN_REFRESH_INTERVAL_SECONDS))
}

/// A tick only does work while a session exists at fire time.
pub(crate) fn should_attempt_refresh(status: SessionStatus) -> bool {
    matches!(status, SessionStatus::Authenticated)
}
