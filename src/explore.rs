//! Exploration harness
//!
//! The production API takes explicit arguments. Model checking a contract
//! protocol instead needs every legal move from a state, so this module
//! enumerates enabled actions over a finite [`Universe`] and searches the
//! reachable states, checking ledger invariants and transition properties
//! along the way. Each `(state, action)` pair is applied to its own copy
//! of the state.

use crate::block::eligible_for_confirmation;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::ledger::LedgerState;
use crate::mempool::check_spend;
use crate::oracle::StructuralOracle;
use crate::transaction::create_output;
use crate::transition::{apply, Action};
use crate::types::*;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Finite pool of values actions may draw their arguments from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    pub ids: Vec<TxId>,
    pub keys: Vec<Key>,
    pub amounts: Vec<Amount>,
    pub preimages: Vec<HashValue>,
    pub timelocks: Vec<Natural>,
}

impl Universe {
    /// Two keys, one amount, one preimage, a zero timelock, `id_count` ids
    pub fn small(id_count: u64) -> Self {
        Self {
            ids: (1..=id_count).map(TxId).collect(),
            keys: vec![Key::from("A"), Key::from("B")],
            amounts: vec![100],
            preimages: vec![HashValue([1; 32])],
            timelocks: vec![0],
        }
    }

    /// Every output the universe can build under `config`
    pub fn candidate_outputs(&self, config: &LedgerConfig) -> Vec<Output> {
        let mut outputs = Vec::new();
        for &amount in &self.amounts {
            for key in &self.keys {
                outputs.extend(
                    create_output(
                        OutputType::P2wkh,
                        vec![key.clone()],
                        None,
                        None,
                        amount,
                        config.timelock,
                    )
                    .ok(),
                );
            }
            if !self.keys.is_empty() {
                outputs.extend(
                    create_output(
                        OutputType::Multisig,
                        self.keys.clone(),
                        None,
                        None,
                        amount,
                        config.timelock,
                    )
                    .ok(),
                );
                for &timelock in &self.timelocks {
                    outputs.extend(
                        create_output(
                            OutputType::MultisigWithTimelock,
                            self.keys.clone(),
                            Some(timelock),
                            None,
                            amount,
                            config.timelock,
                        )
                        .ok(),
                    );
                }
            }
            for preimage in &self.preimages {
                outputs.extend(
                    create_output(
                        OutputType::HashLock,
                        vec![],
                        None,
                        Some(*preimage),
                        amount,
                        config.timelock,
                    )
                    .ok(),
                );
            }
        }
        outputs
    }

    /// Authorizations worth trying against `output`: the satisfying one,
    /// each single key, the full key set and each preimage
    pub fn candidate_authorizations(&self, output: &Output) -> Vec<Authorization> {
        let mut candidates = BTreeSet::new();
        candidates.insert(Authorization::satisfying(output));
        for key in &self.keys {
            candidates.insert(Authorization::signed_by(vec![key.clone()]));
        }
        candidates.insert(Authorization::signed_by(self.keys.clone()));
        for preimage in &self.preimages {
            candidates.insert(Authorization::revealing(*preimage));
        }
        candidates.into_iter().collect()
    }

    fn next_id(&self, state: &LedgerState) -> Option<TxId> {
        self.ids.iter().copied().find(|id| !state.is_known(*id))
    }
}

/// Every action enabled in `state`.
///
/// Only the lowest unused id is offered for new transactions: ids are
/// interchangeable labels, so the other choices reach equivalent states.
pub fn enabled_actions(state: &LedgerState, universe: &Universe, config: &LedgerConfig) -> Vec<Action> {
    let mut actions = Vec::new();
    let outputs = universe.candidate_outputs(config);
    let next_id = universe.next_id(state);

    if let Some(id) = next_id {
        for output in &outputs {
            actions.push(Action::IssueCoinbase { id, output: output.clone() });
        }
    }

    for id in eligible_for_confirmation(state, config) {
        actions.push(Action::Confirm { id });
    }

    if let Some(id) = next_id {
        for txid in state.published() {
            let Some(tx) = state.transaction(txid) else {
                continue;
            };
            for spent in &tx.outputs {
                let prevout = OutPoint::new(txid, spent.index);
                for authorization in universe.candidate_authorizations(spent) {
                    if check_spend(&StructuralOracle, state, prevout, &authorization, config).is_err() {
                        continue;
                    }
                    for output in &outputs {
                        actions.push(Action::IssueSpend {
                            id,
                            prevout,
                            authorization: authorization.clone(),
                            output: output.clone(),
                        });
                    }
                }
            }
        }
    }

    actions
}

/// Properties every single transition must keep
///
/// 1. `after` satisfies every state invariant
/// 2. published only grows and its transactions never change
/// 3. chain height is non-decreasing and moves by at most one
/// 4. registered transactions never change or disappear
pub fn check_transition(before: &LedgerState, after: &LedgerState) -> Result<()> {
    after.check_invariants()?;

    for id in before.published() {
        if !after.is_published(id) {
            return Err(LedgerError::InvariantViolation(format!(
                "{} left the published set",
                id
            )));
        }
    }

    for (id, tx) in before.transactions() {
        if after.transaction(id) != Some(tx) {
            return Err(LedgerError::InvariantViolation(format!(
                "{} changed or disappeared",
                id
            )));
        }
    }

    if after.chain_height() < before.chain_height()
        || after.chain_height() > before.chain_height() + 1
    {
        return Err(LedgerError::InvariantViolation(format!(
            "Chain height moved from {} to {}",
            before.chain_height(),
            after.chain_height()
        )));
    }

    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplorationReport {
    /// Distinct states reached, including the initial one
    pub states: usize,
    /// Transitions applied
    pub transitions: usize,
    /// Depth of the last non-empty frontier
    pub depth: usize,
    pub max_height: Natural,
}

/// Breadth-first search of every state reachable within `max_depth` steps.
///
/// An enabled action that is then rejected, or any broken invariant, ends
/// the search with `LedgerError::InvariantViolation`.
pub fn explore(
    initial: &LedgerState,
    universe: &Universe,
    config: &LedgerConfig,
    max_depth: usize,
) -> Result<ExplorationReport> {
    initial.check_invariants()?;

    let mut seen: HashSet<LedgerState> = HashSet::new();
    seen.insert(initial.clone());
    let mut frontier = vec![initial.clone()];
    let mut report = ExplorationReport {
        states: 1,
        max_height: initial.chain_height(),
        ..ExplorationReport::default()
    };

    for depth in 1..=max_depth {
        let mut next_frontier = Vec::new();
        for state in &frontier {
            for action in enabled_actions(state, universe, config) {
                let next = apply(state, &action, config).map_err(|e| {
                    LedgerError::InvariantViolation(format!(
                        "Enabled action '{}' was rejected: {}",
                        action, e
                    ))
                })?;
                check_transition(state, &next)?;
                report.transitions += 1;

                if seen.insert(next.clone()) {
                    report.max_height = report.max_height.max(next.chain_height());
                    next_frontier.push(next);
                }
            }
        }

        if next_frontier.is_empty() {
            break;
        }
        report.depth = depth;
        report.states += next_frontier.len();
        debug!(depth, frontier = next_frontier.len(), "exploration frontier");
        frontier = next_frontier;
    }

    Ok(report)
}

/// Follow one path: at step i take enabled action `choices[i] % count`.
///
/// Stops early when nothing is enabled. Returns the final state and the
/// actions taken.
pub fn walk(
    initial: &LedgerState,
    universe: &Universe,
    config: &LedgerConfig,
    choices: &[usize],
) -> Result<(LedgerState, Vec<Action>)> {
    let mut state = initial.clone();
    let mut taken = Vec::new();

    for &choice in choices {
        let enabled = enabled_actions(&state, universe, config);
        if enabled.is_empty() {
            break;
        }
        let action = enabled[choice % enabled.len()].clone();
        let next = apply(&state, &action, config)?;
        check_transition(&state, &next)?;
        state = next;
        taken.push(action);
    }

    Ok((state, taken))
}
