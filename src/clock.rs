use chrono::{DateTime, Utc};

/// Source of the current time for expiry arithmetic.
///
/// Token issuance and reset-token windows read the time through this trait so
/// that tests can pin it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock, always UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
