//! Single-writer access to a ledger from many threads
//!
//! Transitions do not commute, so every mutation goes through one lock and
//! is applied whole.

use crate::error::Result;
use crate::ledger::LedgerState;
use crate::transition::Action;
use crate::Ledger;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self { inner: Arc::new(Mutex::new(ledger)) }
    }

    pub fn apply(&self, action: &Action) -> Result<()> {
        self.inner.lock().apply(action)
    }

    /// Run `f` against the ledger while holding the lock
    pub fn with<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn snapshot(&self) -> LedgerState {
        self.inner.lock().state().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;
    use std::thread;

    #[test]
    fn test_concurrent_coinbases_serialize() {
        let shared = SharedLedger::default();
        let handles: Vec<_> = (1..=8u64)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let output = shared
                        .with(|ledger| {
                            ledger.create_output(OutputType::P2wkh, vec![Key::from("A")], None, None, i)
                        })
                        .unwrap();
                    shared
                        .apply(&Action::IssueCoinbase { id: TxId(i), output })
                        .unwrap();
                    shared.apply(&Action::Confirm { id: TxId(i) }).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let state = shared.snapshot();
        assert_eq!(state.chain_height(), 8);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_racing_duplicate_ids_admit_one() {
        let shared = SharedLedger::default();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let output = Output {
                        index: 0,
                        condition: SpendCondition::P2wkh { key: Key::from("A") },
                        amount: 1,
                    };
                    shared.apply(&Action::IssueCoinbase { id: TxId(1), output })
                })
            })
            .collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(shared.with(|ledger| ledger.is_pending(TxId(1))));
    }
}
