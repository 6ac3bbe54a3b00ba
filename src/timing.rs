//! Phase clock, per-command deadlines, and the tap-rate governor (ç4.I).
//! The kernel wraps every transceive with the deadline named here; timeouts
//! and card-removed both fail the transaction the same way (ç5).

use std::time::{Duration, Instant};

use crate::apdu::CommandApdu;

/// Per-command deadlines, ç4.I. Looked up by instruction byte since that's
/// what actually distinguishes a SELECT from a GPO from a READ RECORD on
/// the wire.
pub fn command_deadline(command: &CommandApdu) -> Duration {
    match (command.cla, command.ins) {
        (0x00, 0xa4) => Duration::from_millis(100), // SELECT
        (0x80, 0xa8) => Duration::from_millis(250), // GET PROCESSING OPTIONS
        (0x00, 0xb2) => Duration::from_millis(100), // READ RECORD
        (0x80, 0xae) => Duration::from_millis(250), // GENERATE AC
        (0x80, 0xca) => Duration::from_millis(100), // GET DATA
        (0x00, 0x20) => Duration::from_millis(150), // VERIFY
        (0x80, 0x2a) => Duration::from_millis(150), // COMPUTE CRYPTOGRAPHIC CHECKSUM
        _ => Duration::from_millis(100),
    }
}

pub const TRANSACTION_TARGET: Duration = Duration::from_millis(500);
pub const TRANSACTION_CEILING: Duration = Duration::from_millis(1000);

/// Records how long each named phase of a transaction took, for post-mortem
/// logging; never consulted for control flow.
#[derive(Debug, Default)]
pub struct PhaseClock {
    started_at: Option<Instant>,
    phase_started_at: Option<Instant>,
    current_phase: Option<&'static str>,
    durations: Vec<(&'static str, Duration)>,
}

impl PhaseClock {
    pub fn new() -> Self {
        PhaseClock::default()
    }

    pub fn start(&mut self) {
        let now = Instant::now();
        self.started_at = Some(now);
        self.phase_started_at = Some(now);
    }

    pub fn enter_phase(&mut self, name: &'static str) {
        let now = Instant::now();
        if let (Some(prev_name), Some(prev_started)) = (self.current_phase, self.phase_started_at)
        {
            self.durations.push((prev_name, now - prev_started));
        }
        self.current_phase = Some(name);
        self.phase_started_at = Some(now);
    }

    pub fn finish(&mut self) -> Vec<(&'static str, Duration)> {
        let now = Instant::now();
        if let (Some(prev_name), Some(prev_started)) = (self.current_phase, self.phase_started_at)
        {
            self.durations.push((prev_name, now - prev_started));
        }
        self.current_phase = None;
        self.durations.clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.map_or(Duration::ZERO, |t| t.elapsed())
    }

    pub fn exceeded_ceiling(&self) -> bool {
        self.elapsed() > TRANSACTION_CEILING
    }
}

/// Tap-rate governor: disallows a new transaction until `min_interval`
/// elapsed since the previous one, and caps transactions per rolling minute.
pub struct RateLimiter {
    min_interval: Duration,
    max_per_minute: usize,
    last_transaction: Option<Instant>,
    recent: Vec<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, max_per_minute: usize) -> Self {
        RateLimiter {
            min_interval,
            max_per_minute,
            last_transaction: None,
            recent: Vec::new(),
        }
    }

    pub fn allow(&mut self) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_transaction {
            if now.duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.recent.retain(|t| now.duration_since(*t) < Duration::from_secs(60));
        if self.recent.len() >= self.max_per_minute {
            return false;
        }
        self.last_transaction = Some(now);
        self.recent.push(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_has_100ms_deadline() {
        let cmd = CommandApdu::select(b"A0000000031010");
        assert_eq!(command_deadline(&cmd), Duration::from_millis(100));
    }

    #[test]
    fn gpo_has_250ms_deadline() {
        let cmd = CommandApdu::get_processing_options(&[]);
        assert_eq!(command_deadline(&cmd), Duration::from_millis(250));
    }

    #[test]
    fn rate_limiter_blocks_back_to_back_transactions() {
        let mut limiter = RateLimiter::new(Duration::from_secs(5), 10);
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }
}
