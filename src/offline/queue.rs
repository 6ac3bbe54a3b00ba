//! Store-and-forward queue for offline transactions the gate allowed, plus
//! the submitter contract that eventually reconciles them with the host.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Submitted,
    Declined,
    Failed,
}

#[derive(Debug, Clone)]
pub struct OfflineTransaction {
    pub id: Uuid,
    pub pan_hash: [u8; 32],
    pub amount: u64,
    pub currency: [u8; 2],
    pub cryptogram_hex: String,
    pub auxiliary_fields: Vec<(u32, Vec<u8>)>,
    pub timestamp: SystemTime,
    pub status: TransactionStatus,
    pub attempt_count: u32,
    pub last_attempt: Option<SystemTime>,
    pub submitted_at: Option<SystemTime>,
}

impl OfflineTransaction {
    pub fn new(
        pan_hash: [u8; 32],
        amount: u64,
        currency: [u8; 2],
        cryptogram: Vec<u8>,
        auxiliary_fields: Vec<(u32, Vec<u8>)>,
    ) -> Self {
        OfflineTransaction {
            id: Uuid::new_v4(),
            pan_hash,
            amount,
            currency,
            cryptogram_hex: hex::encode(cryptogram),
            auxiliary_fields,
            timestamp: SystemTime::now(),
            status: TransactionStatus::Pending,
            attempt_count: 0,
            last_attempt: None,
            submitted_at: None,
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Approved(String),
    Declined(String),
    Error(String),
}

/// `submit(OfflineTransaction) -> {Approved(authCode), Declined(reason), Error(reason)}` (ç6).
pub trait OfflineSubmitter {
    fn submit(&mut self, txn: &OfflineTransaction) -> SubmitOutcome;
}

const RETENTION_WINDOW: Duration = Duration::from_secs(7 * 24 * 3600);

/// A plain mutex-guarded deque is enough here: the submitter drains this on
/// a single background tick, and the gate only ever pushes — no contention
/// pattern worth a lock-free structure.
pub struct OfflineQueue {
    records: Mutex<VecDeque<OfflineTransaction>>,
}

impl Default for OfflineQueue {
    fn default() -> Self {
        OfflineQueue::new()
    }
}

impl OfflineQueue {
    pub fn new() -> Self {
        OfflineQueue {
            records: Mutex::new(VecDeque::new()),
        }
    }

    pub fn enqueue(&self, txn: OfflineTransaction) {
        self.records.lock().unwrap().push_back(txn);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain every `PENDING` record through `submitter`, retry bookkeeping
    /// per ç4.G/ç7: attempt count and last-attempt are stamped on every
    /// try; transient errors keep the record `PENDING`. Called on a
    /// periodic tick and on explicit flush.
    pub fn flush(&self, submitter: &mut dyn OfflineSubmitter) {
        let mut records = self.records.lock().unwrap();
        for txn in records.iter_mut() {
            if txn.status != TransactionStatus::Pending {
                continue;
            }
            txn.attempt_count += 1;
            txn.last_attempt = Some(SystemTime::now());
            match submitter.submit(txn) {
                SubmitOutcome::Approved(_) => {
                    txn.status = TransactionStatus::Submitted;
                    txn.submitted_at = Some(SystemTime::now());
                }
                SubmitOutcome::Declined(_) => {
                    txn.status = TransactionStatus::Declined;
                    txn.submitted_at = Some(SystemTime::now());
                }
                SubmitOutcome::Error(_) => {
                    // Transient: stays PENDING for the next tick.
                }
            }
        }
        self.purge_locked(&mut records);
    }

    /// Purge `SUBMITTED`/`DECLINED` records past the retention window.
    pub fn purge_expired(&self) {
        let mut records = self.records.lock().unwrap();
        self.purge_locked(&mut records);
    }

    fn purge_locked(&self, records: &mut VecDeque<OfflineTransaction>) {
        let now = SystemTime::now();
        records.retain(|txn| {
            if txn.status == TransactionStatus::Pending || txn.status == TransactionStatus::Failed
            {
                return true;
            }
            match txn.submitted_at {
                Some(ts) => now.duration_since(ts).unwrap_or(Duration::ZERO) < RETENTION_WINDOW,
                None => true,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysApprove;
    impl OfflineSubmitter for AlwaysApprove {
        fn submit(&mut self, _txn: &OfflineTransaction) -> SubmitOutcome {
            SubmitOutcome::Approved("A1B2C3".to_string())
        }
    }

    struct AlwaysError;
    impl OfflineSubmitter for AlwaysError {
        fn submit(&mut self, _txn: &OfflineTransaction) -> SubmitOutcome {
            SubmitOutcome::Error("no network".to_string())
        }
    }

    #[test]
    fn flush_marks_submitted_on_approval() {
        let queue = OfflineQueue::new();
        queue.enqueue(OfflineTransaction::new(
            [0u8; 32],
            500,
            [0x08, 0x40],
            vec![0xaa; 8],
            Vec::new(),
        ));
        queue.flush(&mut AlwaysApprove);
        let records = queue.records.lock().unwrap();
        assert_eq!(records[0].status, TransactionStatus::Submitted);
        assert!(records[0].attempt_count >= 1);
        assert!(records[0].submitted_at.unwrap() >= records[0].timestamp);
    }

    #[test]
    fn transient_error_keeps_record_pending() {
        let queue = OfflineQueue::new();
        queue.enqueue(OfflineTransaction::new(
            [1u8; 32],
            500,
            [0x08, 0x40],
            vec![0xaa; 8],
            Vec::new(),
        ));
        queue.flush(&mut AlwaysError);
        let records = queue.records.lock().unwrap();
        assert_eq!(records[0].status, TransactionStatus::Pending);
        assert_eq!(records[0].attempt_count, 1);
    }
}
