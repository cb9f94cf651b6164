use chrono::Utc;

/// Wall-clock source used to stamp decoded readings.
pub trait TimeSource: Send + Sync {
    /// Seconds since the Unix epoch, with sub-second precision.
    fn now_seconds(&self) -> f64;
}

pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now_seconds(&self) -> f64 {
        Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }
}

/// Always reports the same instant. Handy for replaying captures.
pub struct FixedClock(pub f64);

impl TimeSource for FixedClock {
    fn now_seconds(&self) -> f64 {
        self.0
    }
}
