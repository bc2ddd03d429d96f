//! Ledger state: registry, mempool, published set and chain height
//!
//! `LedgerState` is a plain value. Transitions in [`crate::mempool`] and
//! [`crate::block`] take it explicitly; nothing here is global. Ordered
//! collections keep snapshots and digests deterministic.

use crate::constants::GENESIS_HEIGHT;
use crate::error::{LedgerError, Result};
use crate::transaction::check_transaction;
use crate::types::*;
use bitcoin_hashes::{sha256d, Hash as BitcoinHash};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerState {
    chain_height: Natural,
    registry: BTreeMap<TxId, Transaction>,
    mempool: BTreeSet<TxId>,
    published: BTreeSet<TxId>,
    confirmed_at: BTreeMap<TxId, Natural>,
    spent: BTreeSet<OutPoint>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self { chain_height: GENESIS_HEIGHT, ..Self::default() }
    }

    pub fn chain_height(&self) -> Natural {
        self.chain_height
    }

    pub fn transaction(&self, id: TxId) -> Option<&Transaction> {
        self.registry.get(&id)
    }

    /// Any output the registry knows, confirmed or not
    pub fn get_output(&self, outpoint: &OutPoint) -> Option<&Output> {
        self.registry
            .get(&outpoint.txid)
            .and_then(|tx| tx.output(outpoint.index))
    }

    /// An output of a published transaction: the only kind a spend may reference
    pub fn published_output(&self, outpoint: &OutPoint) -> Option<&Output> {
        if !self.is_published(outpoint.txid) {
            return None;
        }
        self.get_output(outpoint)
    }

    /// Ids are never reused, so anything ever registered counts
    pub fn is_known(&self, id: TxId) -> bool {
        self.registry.contains_key(&id)
    }

    pub fn is_pending(&self, id: TxId) -> bool {
        self.mempool.contains(&id)
    }

    pub fn is_published(&self, id: TxId) -> bool {
        self.published.contains(&id)
    }

    pub fn is_spent(&self, outpoint: &OutPoint) -> bool {
        self.spent.contains(outpoint)
    }

    /// Height at which `id` was confirmed
    pub fn confirmed_at(&self, id: TxId) -> Option<Natural> {
        self.confirmed_at.get(&id).copied()
    }

    pub fn mempool(&self) -> impl Iterator<Item = TxId> + '_ {
        self.mempool.iter().copied()
    }

    pub fn published(&self) -> impl Iterator<Item = TxId> + '_ {
        self.published.iter().copied()
    }

    pub fn transactions(&self) -> impl Iterator<Item = (TxId, &Transaction)> + '_ {
        self.registry.iter().map(|(id, tx)| (*id, tx))
    }

    pub fn spent_outputs(&self) -> impl Iterator<Item = OutPoint> + '_ {
        self.spent.iter().copied()
    }

    pub(crate) fn insert_pending(&mut self, id: TxId, tx: Transaction) {
        self.registry.insert(id, tx);
        self.mempool.insert(id);
    }

    /// Move `id` from mempool to published in a new block; returns its height
    pub(crate) fn publish(&mut self, id: TxId) -> Natural {
        self.mempool.remove(&id);
        self.published.insert(id);
        self.chain_height += 1;
        self.confirmed_at.insert(id, self.chain_height);
        self.chain_height
    }

    pub(crate) fn mark_spent(&mut self, outpoint: OutPoint) {
        self.spent.insert(outpoint);
    }

    /// Check every structural invariant of the state.
    ///
    /// 1. mempool ∩ published = ∅
    /// 2. mempool ∪ published ⊆ dom(registry)
    /// 3. dom(confirmed_at) = published, each height in 1..=chain_height, all distinct
    /// 4. |published| = chain_height (one transaction per block)
    /// 5. every registered transaction is either pending or published
    /// 6. every spent outpoint names a registered output
    /// 7. every registered transaction is well formed (`check_transaction`)
    /// 8. every input names an output of a published transaction
    pub fn check_invariants(&self) -> Result<()> {
        if let Some(id) = self.mempool.intersection(&self.published).next() {
            return Err(LedgerError::InvariantViolation(format!(
                "{} is both pending and published",
                id
            )));
        }

        for id in self.mempool.iter().chain(self.published.iter()) {
            if !self.registry.contains_key(id) {
                return Err(LedgerError::InvariantViolation(format!(
                    "{} has no registry entry",
                    id
                )));
            }
        }

        if self.confirmed_at.len() != self.published.len()
            || !self.confirmed_at.keys().all(|id| self.published.contains(id))
        {
            return Err(LedgerError::InvariantViolation(
                "Confirmation heights do not match the published set".to_string(),
            ));
        }

        let heights: BTreeSet<Natural> = self.confirmed_at.values().copied().collect();
        if heights.len() != self.confirmed_at.len()
            || heights
                .iter()
                .any(|h| *h == GENESIS_HEIGHT || *h > self.chain_height)
        {
            return Err(LedgerError::InvariantViolation(
                "Confirmation heights are not one per block".to_string(),
            ));
        }

        if self.published.len() as Natural != self.chain_height {
            return Err(LedgerError::InvariantViolation(format!(
                "Chain height {} with {} published transactions",
                self.chain_height,
                self.published.len()
            )));
        }

        for id in self.registry.keys() {
            if !self.mempool.contains(id) && !self.published.contains(id) {
                return Err(LedgerError::InvariantViolation(format!(
                    "{} is registered but neither pending nor published",
                    id
                )));
            }
        }

        if let Some(outpoint) = self.spent.iter().find(|o| self.get_output(o).is_none()) {
            return Err(LedgerError::InvariantViolation(format!(
                "Spent outpoint {} does not exist",
                outpoint
            )));
        }

        for (id, tx) in &self.registry {
            if let ValidationResult::Invalid(reason) = check_transaction(tx)? {
                return Err(LedgerError::InvariantViolation(format!(
                    "{} is malformed: {}",
                    id, reason
                )));
            }
            if let Some(input) = tx
                .inputs
                .iter()
                .find(|input| self.published_output(&input.prevout).is_none())
            {
                return Err(LedgerError::InvariantViolation(format!(
                    "{} spends {}, which is not a published output",
                    id, input.prevout
                )));
            }
        }

        Ok(())
    }

    /// Double-SHA256 of the canonical JSON snapshot
    pub fn digest(&self) -> Result<Hash> {
        let bytes = serde_json::to_vec(self)?;
        Ok(sha256d::Hash::hash(&bytes).into_inner())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a snapshot, refusing any that breaks an invariant
    pub fn from_json(json: &str) -> Result<Self> {
        let state: LedgerState = serde_json::from_str(json)?;
        state.check_invariants()?;
        Ok(state)
    }
}
