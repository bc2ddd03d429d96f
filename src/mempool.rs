//! Mempool admission: coinbase issue and spend issue
//!
//! Each function checks every precondition before touching the state, so a
//! rejected transition leaves the ledger exactly as it was.

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::ledger::LedgerState;
use crate::oracle::{SpendOracle, StructuralOracle};
use crate::script::{verify_spend_with, SpendContext};
use crate::transaction::{check_transaction, make_coinbase, make_spending_transaction};
use crate::types::*;
use tracing::{debug, warn};

/// IssueCoinbase: 𝒮 × TxId × 𝒪𝓊𝓉 → 𝒮
///
/// 1. id ∉ dom(registry)
/// 2. registry[id] = {inputs: [], outputs: [output]}
/// 3. mempool += {id}
pub fn accept_coinbase(state: &mut LedgerState, id: TxId, output: Output) -> Result<TxId> {
    if state.is_known(id) {
        return Err(LedgerError::DuplicateId(id));
    }

    let tx = make_coinbase(vec![output]);
    ensure_well_formed(&tx)?;

    let created = &tx.outputs[0];
    debug!(txid = %id, output = %created, "coinbase admitted to mempool");
    state.insert_pending(id, tx);
    Ok(id)
}

/// IssueSpend: 𝒮 × TxId × 𝒪 × 𝒜 × 𝒪𝓊𝓉 → 𝒮
///
/// 1. id ∉ dom(registry)
/// 2. prevout names an output of a published transaction
/// 3. VerifySpend(output(prevout), input, ctx) with ctx.spend_height = height + 1
/// 4. under spent-output tracking: prevout ∉ spent
/// 5. registry[id] = spend; mempool += {id}
pub fn accept_spend(
    state: &mut LedgerState,
    id: TxId,
    prevout: OutPoint,
    authorization: &Authorization,
    output: Output,
    config: &LedgerConfig,
) -> Result<TxId> {
    accept_spend_with(&StructuralOracle, state, id, prevout, authorization, output, config)
}

/// [`accept_spend`] with spend conditions judged by `oracle`
pub fn accept_spend_with<O: SpendOracle + ?Sized>(
    oracle: &O,
    state: &mut LedgerState,
    id: TxId,
    prevout: OutPoint,
    authorization: &Authorization,
    output: Output,
    config: &LedgerConfig,
) -> Result<TxId> {
    if state.is_known(id) {
        return Err(LedgerError::DuplicateId(id));
    }

    let spent_output = state
        .published_output(&prevout)
        .ok_or(LedgerError::UnknownOutput(prevout))?;
    let tx = make_spending_transaction(prevout, spent_output, vec![output], authorization)?;
    ensure_well_formed(&tx)?;

    check_spend_input(oracle, state, &tx.inputs[0], config)?;

    let created = &tx.outputs[0];
    debug!(txid = %id, %prevout, output = %created, "spend admitted to mempool");
    state.insert_pending(id, tx);
    if config.tracks_spent_outputs() {
        state.mark_spent(prevout);
    }
    Ok(id)
}

/// Preconditions 2–4 of IssueSpend for a would-be input, without admitting anything
pub fn check_spend<O: SpendOracle + ?Sized>(
    oracle: &O,
    state: &LedgerState,
    prevout: OutPoint,
    authorization: &Authorization,
    config: &LedgerConfig,
) -> Result<()> {
    let input = Input {
        prevout,
        sighash: authorization.sighash,
        claimed_signers: authorization.signers.clone(),
        revealed_preimage: authorization.preimage,
    };
    check_spend_input(oracle, state, &input, config)
}

fn check_spend_input<O: SpendOracle + ?Sized>(
    oracle: &O,
    state: &LedgerState,
    input: &Input,
    config: &LedgerConfig,
) -> Result<()> {
    let prevout = input.prevout;
    let spent_output = state
        .published_output(&prevout)
        .ok_or(LedgerError::UnknownOutput(prevout))?;
    let confirmed_height = state
        .confirmed_at(prevout.txid)
        .ok_or(LedgerError::UnknownOutput(prevout))?;
    let context = SpendContext::new(confirmed_height, state.chain_height() + 1);

    if !verify_spend_with(oracle, spent_output, input, &context) {
        let output_type = spent_output.output_type();
        let age = context.age();
        warn!(%prevout, ?output_type, age, "spend condition not satisfied");
        return Err(LedgerError::ConditionNotSatisfied(prevout));
    }

    if config.tracks_spent_outputs() && state.is_spent(&prevout) {
        return Err(LedgerError::AlreadySpent(prevout));
    }

    Ok(())
}

fn ensure_well_formed(tx: &Transaction) -> Result<()> {
    match check_transaction(tx)? {
        ValidationResult::Valid => Ok(()),
        ValidationResult::Invalid(reason) => Err(LedgerError::ContractViolation(reason)),
    }
}
