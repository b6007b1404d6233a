//! Size and time estimates for planning
//!
//! Rough numbers only: tokens are approximated from characters and call
//! time from an assumed generation rate. Nothing here affects control flow
//! of a real run.

use crate::config::DigestConfig;
use std::time::Duration;

/// Rule-of-thumb characters per token for English prose
pub const CHARS_PER_TOKEN: usize = 4;

/// Approximate token count of `chars` characters, rounded up.
pub fn estimate_tokens(chars: usize) -> usize {
    chars.div_ceil(CHARS_PER_TOKEN)
}

/// Projected duration of backend work.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingModel {
    pub tokens_per_second: f64,
    pub output_tokens_per_call: u32,
    pub chunk_delay: Duration,
    pub batch_delay: Duration,
}

impl TimingModel {
    pub fn from_config(config: &DigestConfig) -> Self {
        Self {
            tokens_per_second: config.tokens_per_second,
            output_tokens_per_call: config.output_tokens_per_call,
            chunk_delay: config.chunk_delay(),
            batch_delay: config.batch_delay(),
        }
    }

    /// Expected time of one generation call.
    pub fn per_call(&self) -> Duration {
        if self.tokens_per_second <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(f64::from(self.output_tokens_per_call) / self.tokens_per_second)
    }

    /// `calls` generations plus `delays` inter-chunk pauses.
    pub fn sequential(&self, calls: usize, delays: usize) -> Duration {
        self.per_call() * calls as u32 + self.chunk_delay * delays as u32
    }
}

/// `1h 02m 03s`, `4m 05s`, or `12s`.
pub fn format_duration(d: Duration) -> String {
    let total = d.as_secs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> TimingModel {
        TimingModel {
            tokens_per_second: 20.0,
            output_tokens_per_call: 800,
            chunk_delay: Duration::from_secs(2),
            batch_delay: Duration::from_secs(5),
        }
    }

    #[test]
    fn tokens_round_up() {
        assert_eq!(estimate_tokens(0), 0);
        assert_eq!(estimate_tokens(1), 1);
        assert_eq!(estimate_tokens(8), 2);
        assert_eq!(estimate_tokens(9), 3);
    }

    #[test]
    fn per_call_from_rate() {
        assert_eq!(model().per_call(), Duration::from_secs(40));
    }

    #[test]
    fn sequential_adds_delays() {
        // 4 calls at 40s + 2 delays at 2s
        assert_eq!(model().sequential(4, 2), Duration::from_secs(164));
    }

    #[test]
    fn durations_format_compactly() {
        assert_eq!(format_duration(Duration::from_secs(12)), "12s");
        assert_eq!(format_duration(Duration::from_secs(245)), "4m 05s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h 02m 03s");
    }

    #[test]
    fn timing_from_config() {
        let config = DigestConfig::default();
        let model = TimingModel::from_config(&config);
        assert_eq!(model.chunk_delay, Duration::from_millis(config.chunk_delay_ms));
    }
}
