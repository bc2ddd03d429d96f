//! Confirmation: one pending transaction per block

use crate::config::{ConfirmationPolicy, LedgerConfig};
use crate::error::{LedgerError, Result};
use crate::ledger::LedgerState;
use crate::types::*;
use tracing::info;

/// ConfirmPending: 𝒮 × TxId → 𝒮
///
/// 1. id ∈ mempool
/// 2. under coinbase-only confirmation: registry[id].inputs = []
/// 3. published += {id}; mempool -= {id}; height += 1
///
/// Returns the new chain height.
pub fn confirm_pending(state: &mut LedgerState, id: TxId, config: &LedgerConfig) -> Result<Natural> {
    if !state.is_pending(id) {
        return Err(LedgerError::NotPending(id));
    }
    if !is_eligible(state, id, config) {
        return Err(LedgerError::NotEligible(id));
    }

    let height = state.publish(id);
    info!(txid = %id, height, "transaction confirmed");
    Ok(height)
}

/// Pending ids `confirm_pending` would accept
pub fn eligible_for_confirmation(state: &LedgerState, config: &LedgerConfig) -> Vec<TxId> {
    state
        .mempool()
        .filter(|id| is_eligible(state, *id, config))
        .collect()
}

fn is_eligible(state: &LedgerState, id: TxId, config: &LedgerConfig) -> bool {
    match config.confirmation {
        ConfirmationPolicy::AnyPending => true,
        ConfirmationPolicy::CoinbaseOnly => state
            .transaction(id)
            .is_some_and(Transaction::is_coinbase),
    }
}
