use log::info;
use serde::Serialize;

/// Counters kept by the acquisition loop over its lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollStats {
    pub ticks: u64,
    pub due_cycles: u64,
    /// Due cycles that found bytes waiting and read them.
    pub attempts: u64,
    pub decoded: u64,
    /// Decodes where no frame marker was found.
    pub fallback_decodes: u64,
    pub insufficient: u64,
    pub empty_cycles: u64,
    pub closed_ticks: u64,
    pub write_failures: u64,
    pub read_failures: u64,
    pub publishes: u64,
    pub publish_failures: u64,
}

impl PollStats {
    pub fn decode_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.decoded as f64 / self.attempts as f64 * 100.0
    }

    pub fn log_summary(&self) {
        info!("📊 Final Statistics:");
        info!("   ⏱️  Ticks: {} ({} due, {} while closed)", self.ticks, self.due_cycles, self.closed_ticks);
        info!("   📥 Read attempts: {} ({} empty cycles)", self.attempts, self.empty_cycles);
        info!("   ✅ Decoded: {} ({} without marker), {:.1}%",
              self.decoded, self.fallback_decodes, self.decode_rate());
        info!("   ❌ Short reads: {}, write failures: {}, read failures: {}",
              self.insufficient, self.write_failures, self.read_failures);
        info!("   📤 Published: {} ({} failed)", self.publishes, self.publish_failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rate() {
        let mut stats = PollStats::default();
        assert_eq!(stats.decode_rate(), 0.0);

        stats.attempts = 4;
        stats.decoded = 3;
        assert_eq!(stats.decode_rate(), 75.0);
    }
}
