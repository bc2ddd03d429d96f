//! Transitions as values
//!
//! An [`Action`] names one transition with all of its arguments. [`apply`]
//! is the copy-on-write form `(State, Action) → State | Err`; [`step`]
//! mutates in place. Both leave the input untouched on error.

use crate::block::confirm_pending;
use crate::config::LedgerConfig;
use crate::error::Result;
use crate::ledger::LedgerState;
use crate::mempool::{accept_coinbase, accept_spend_with};
use crate::oracle::{SpendOracle, StructuralOracle};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    IssueCoinbase {
        id: TxId,
        output: Output,
    },
    Confirm {
        id: TxId,
    },
    IssueSpend {
        id: TxId,
        prevout: OutPoint,
        authorization: Authorization,
        output: Output,
    },
}

impl Action {
    /// The transaction id the action creates or confirms
    pub fn txid(&self) -> TxId {
        match self {
            Action::IssueCoinbase { id, .. }
            | Action::Confirm { id }
            | Action::IssueSpend { id, .. } => *id,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::IssueCoinbase { id, output } => write!(f, "coinbase {} -> {}", id, output),
            Action::Confirm { id } => write!(f, "confirm {}", id),
            Action::IssueSpend { id, prevout, output, .. } => {
                write!(f, "spend {} from {} -> {}", id, prevout, output)
            }
        }
    }
}

/// Apply `action` to `state` in place
pub fn step(state: &mut LedgerState, action: &Action, config: &LedgerConfig) -> Result<()> {
    step_with(&StructuralOracle, state, action, config)
}

pub fn step_with<O: SpendOracle + ?Sized>(
    oracle: &O,
    state: &mut LedgerState,
    action: &Action,
    config: &LedgerConfig,
) -> Result<()> {
    match action {
        Action::IssueCoinbase { id, output } => {
            accept_coinbase(state, *id, output.clone())?;
        }
        Action::Confirm { id } => {
            confirm_pending(state, *id, config)?;
        }
        Action::IssueSpend { id, prevout, authorization, output } => {
            accept_spend_with(oracle, state, *id, *prevout, authorization, output.clone(), config)?;
        }
    }
    Ok(())
}

/// Apply `action` to a copy of `state`
pub fn apply(state: &LedgerState, action: &Action, config: &LedgerConfig) -> Result<LedgerState> {
    let mut next = state.clone();
    step(&mut next, action, config)?;
    Ok(next)
}

/// Apply `actions` in order, stopping at the first rejected one
pub fn replay<'a>(
    state: &LedgerState,
    actions: impl IntoIterator<Item = &'a Action>,
    config: &LedgerConfig,
) -> Result<LedgerState> {
    let mut next = state.clone();
    for action in actions {
        step(&mut next, action, config)?;
    }
    Ok(next)
}
