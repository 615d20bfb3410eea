use time::OffsetDateTime;

/// Source of the ledger's notion of "now", in Unix seconds.
pub trait Clock {
    fn unix_timestamp(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn unix_timestamp(&self) -> i64 {
        self.0
    }
}
