//! Offline transaction gate (ç4.G): per-PAN-hash cumulative/consecutive/
//! velocity/time policy, backed by a concurrent tracking map plus a
//! store-and-forward queue for the offline transactions it allows through.

pub mod queue;

use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use rand::Rng;

pub use queue::{OfflineSubmitter, OfflineTransaction, SubmitOutcome, TransactionStatus};

#[derive(Debug, Clone, Copy)]
pub struct OfflinePolicy {
    pub floor_limit: u64,
    pub cumulative_offline_ceiling: u64,
    pub max_consecutive_offline: u32,
    pub allow_first_offline: bool,
    pub base_velocity_probability: u8,
    pub max_time_since_online: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct CardTrackingState {
    pub cumulative_offline_amount: u64,
    pub consecutive_offline_count: u32,
    pub last_online: Option<SystemTime>,
    pub last_offline: Option<SystemTime>,
    seen: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForceOnlineFlags {
    pub floor_exceeded: bool,
    pub first_time_card: bool,
    pub cumulative_limit_exceeded: bool,
    pub consecutive_limit_exceeded: bool,
    pub velocity_selected: bool,
    pub time_limit_exceeded: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum OfflineDecision {
    AllowOffline,
    ForceOnline {
        reason: &'static str,
        flags: ForceOnlineFlags,
    },
}

/// Tracks card state keyed by PAN hash and decides `shouldForceOnline`.
/// Shared across transactions; safe for concurrent readers plus a single
/// background submitter, per ç5.
pub struct OfflineGate {
    policy: OfflinePolicy,
    cards: DashMap<[u8; 32], CardTrackingState>,
    queue: queue::OfflineQueue,
}

impl OfflineGate {
    pub fn new(policy: OfflinePolicy) -> Self {
        OfflineGate {
            policy,
            cards: DashMap::new(),
            queue: queue::OfflineQueue::new(),
        }
    }

    pub fn queue(&self) -> &queue::OfflineQueue {
        &self.queue
    }

    /// Decision order per ç4.G: floor limit, first-time-seen, cumulative
    /// ceiling, consecutive ceiling, randomized velocity, time-since-online.
    pub fn should_force_online(&self, pan_hash: [u8; 32], amount: u64) -> OfflineDecision {
        let mut flags = ForceOnlineFlags::default();

        // A floor limit of zero means "no floor enforced", not "every
        // transaction exceeds it" — matching ç8 scenario 5, where a zero
        // floor limit does not itself force online.
        if self.policy.floor_limit > 0 && amount > self.policy.floor_limit {
            flags.floor_exceeded = true;
            return OfflineDecision::ForceOnline {
                reason: "amount exceeds floor limit",
                flags,
            };
        }

        let state = self.cards.entry(pan_hash).or_default();

        if !state.seen && !self.policy.allow_first_offline {
            flags.first_time_card = true;
            return OfflineDecision::ForceOnline {
                reason: "first time seeing this card",
                flags,
            };
        }

        if state.cumulative_offline_amount + amount > self.policy.cumulative_offline_ceiling {
            flags.cumulative_limit_exceeded = true;
            return OfflineDecision::ForceOnline {
                reason: "cumulative offline ceiling exceeded",
                flags,
            };
        }

        if state.consecutive_offline_count >= self.policy.max_consecutive_offline {
            flags.consecutive_limit_exceeded = true;
            return OfflineDecision::ForceOnline {
                reason: "consecutive offline ceiling exceeded",
                flags,
            };
        }

        let ratio = if self.policy.cumulative_offline_ceiling == 0 {
            1.0
        } else {
            state.cumulative_offline_amount as f64
                / self.policy.cumulative_offline_ceiling as f64
        };
        let bonus_from_consecutive = state.consecutive_offline_count as f64 * 5.0;
        let bonus_from_ratio = ratio * 30.0;
        let probability = (self.policy.base_velocity_probability as f64
            + bonus_from_consecutive
            + bonus_from_ratio)
            .min(100.0);
        if rand::thread_rng().gen_range(0.0..100.0) < probability {
            flags.velocity_selected = true;
            return OfflineDecision::ForceOnline {
                reason: "randomized velocity check",
                flags,
            };
        }

        if let Some(last_online) = state.last_online {
            if let Ok(elapsed) = SystemTime::now().duration_since(last_online) {
                if elapsed > self.policy.max_time_since_online {
                    flags.time_limit_exceeded = true;
                    return OfflineDecision::ForceOnline {
                        reason: "too long since last online transaction",
                        flags,
                    };
                }
            }
        }

        OfflineDecision::AllowOffline
    }

    /// A successful online transaction resets consecutive count and
    /// cumulative amount; a failed one leaves counters untouched.
    pub fn record_online_transaction(&self, pan_hash: [u8; 32], success: bool) {
        let mut state = self.cards.entry(pan_hash).or_default();
        state.seen = true;
        if success {
            state.consecutive_offline_count = 0;
            state.cumulative_offline_amount = 0;
            state.last_online = Some(SystemTime::now());
        }
    }

    pub fn record_offline_transaction(&self, pan_hash: [u8; 32], amount: u64, txn: OfflineTransaction) {
        let mut state = self.cards.entry(pan_hash).or_default();
        state.seen = true;
        state.cumulative_offline_amount += amount;
        state.consecutive_offline_count += 1;
        state.last_offline = Some(SystemTime::now());
        self.queue.enqueue(txn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> OfflinePolicy {
        OfflinePolicy {
            floor_limit: 0,
            cumulative_offline_ceiling: 10_000,
            max_consecutive_offline: 3,
            allow_first_offline: true,
            base_velocity_probability: 0,
            max_time_since_online: Duration::from_secs(86400),
        }
    }

    #[test]
    fn forces_online_when_cumulative_ceiling_exceeded() {
        let gate = OfflineGate::new(policy());
        let pan_hash = [1u8; 32];
        {
            let mut state = gate.cards.entry(pan_hash).or_default();
            state.seen = true;
            state.cumulative_offline_amount = 9_500;
            state.consecutive_offline_count = 2;
        }

        match gate.should_force_online(pan_hash, 600) {
            OfflineDecision::ForceOnline { flags, .. } => {
                assert!(flags.cumulative_limit_exceeded);
            }
            OfflineDecision::AllowOffline => panic!("expected ForceOnline"),
        }
    }

    #[test]
    fn nonzero_floor_limit_forces_online_above_it() {
        let mut p = policy();
        p.floor_limit = 500;
        let gate = OfflineGate::new(p);
        match gate.should_force_online([2u8; 32], 600) {
            OfflineDecision::ForceOnline { flags, .. } => assert!(flags.floor_exceeded),
            OfflineDecision::AllowOffline => panic!("expected ForceOnline"),
        }
    }

    #[test]
    fn zero_floor_limit_does_not_force_online_by_itself() {
        let gate = OfflineGate::new(policy());
        match gate.should_force_online([9u8; 32], 1) {
            OfflineDecision::AllowOffline => {}
            OfflineDecision::ForceOnline { reason, .. } => {
                panic!("unexpected ForceOnline: {reason}")
            }
        }
    }

    #[test]
    fn successful_online_resets_counters() {
        let gate = OfflineGate::new(policy());
        let pan_hash = [3u8; 32];
        gate.record_offline_transaction(
            pan_hash,
            100,
            OfflineTransaction::new(pan_hash, 100, [0, 8, 4, 0], vec![0xaa; 8], Vec::new()),
        );
        gate.record_online_transaction(pan_hash, true);
        let state = gate.cards.get(&pan_hash).unwrap();
        assert_eq!(state.cumulative_offline_amount, 0);
        assert_eq!(state.consecutive_offline_count, 0);
    }
}
