//! Transaction and output construction
//!
//! Every value built here already satisfies the data-model invariants, so
//! the ledger never has to reason about half-formed outputs. Misuse (a key
//! count the type cannot take, a missing preimage, an out-of-range timelock)
//! is a contract violation and is reported before anything is built.

use crate::config::TimelockPolicy;
use crate::constants::*;
use crate::error::{LedgerError, Result};
use crate::types::*;

/// MakeOutput: 𝒯𝓎𝓅ℯ × 𝒦* × ℕ → 𝒪𝓊𝓉
///
/// Index 0, no preimage, and for timelocked multisig the maximum relative
/// timelock. Hash locks need a preimage and so must go through
/// [`create_output`].
pub fn make_output(output_type: OutputType, keys: Vec<Key>, amount: Amount) -> Result<Output> {
    create_output(output_type, keys, None, None, amount, TimelockPolicy::Arbitrary)
}

/// CreateOutput: 𝒯𝓎𝓅ℯ × 𝒦* × ℕ? × ℋ? × ℕ → 𝒪𝓊𝓉
///
/// 1. amount ≤ MAX_AMOUNT
/// 2. P2wkh: exactly one key
/// 3. Multisig, MultisigWithTimelock: 1..=MAX_MULTISIG_KEYS distinct keys
/// 4. HashLock: no keys, preimage present
/// 5. timelock only for MultisigWithTimelock, preimage only for HashLock
pub fn create_output(
    output_type: OutputType,
    keys: Vec<Key>,
    timelock: Option<Natural>,
    preimage: Option<HashValue>,
    amount: Amount,
    policy: TimelockPolicy,
) -> Result<Output> {
    if amount > MAX_AMOUNT {
        return Err(LedgerError::ContractViolation(format!(
            "Amount {} exceeds maximum {}",
            amount, MAX_AMOUNT
        )));
    }
    if timelock.is_some() && output_type != OutputType::MultisigWithTimelock {
        return Err(LedgerError::ContractViolation(format!(
            "{:?} output cannot carry a timelock",
            output_type
        )));
    }
    if preimage.is_some() && output_type != OutputType::HashLock {
        return Err(LedgerError::ContractViolation(format!(
            "{:?} output cannot carry a preimage",
            output_type
        )));
    }

    let condition = match output_type {
        OutputType::P2wkh => {
            let mut keys = keys;
            if keys.len() != 1 {
                return Err(LedgerError::ContractViolation(format!(
                    "P2wkh output needs exactly one key, got {}",
                    keys.len()
                )));
            }
            SpendCondition::P2wkh { key: keys.remove(0) }
        }
        OutputType::Multisig => SpendCondition::Multisig { keys: multisig_keys(keys)? },
        OutputType::MultisigWithTimelock => SpendCondition::MultisigWithTimelock {
            keys: multisig_keys(keys)?,
            timelock: resolve_timelock(timelock, policy)?,
        },
        OutputType::HashLock => {
            if !keys.is_empty() {
                return Err(LedgerError::ContractViolation(
                    "HashLock output takes no keys".to_string(),
                ));
            }
            let preimage = preimage.ok_or_else(|| {
                LedgerError::ContractViolation("HashLock output needs a preimage".to_string())
            })?;
            SpendCondition::HashLock { preimage }
        }
    };

    Ok(Output { index: 0, condition, amount })
}

fn multisig_keys(keys: Vec<Key>) -> Result<KeySet> {
    if keys.len() > MAX_MULTISIG_KEYS {
        return Err(LedgerError::ContractViolation(format!(
            "Too many multisig keys: {}",
            keys.len()
        )));
    }
    KeySet::new(keys)
}

/// Absent timelocks take the maximum; explicit ones must respect `policy`
pub fn resolve_timelock(timelock: Option<Natural>, policy: TimelockPolicy) -> Result<Natural> {
    let value = timelock.unwrap_or(MAX_RELATIVE_TIMELOCK);
    if value > MAX_RELATIVE_TIMELOCK {
        return Err(LedgerError::ContractViolation(format!(
            "Timelock {} exceeds maximum {}",
            value, MAX_RELATIVE_TIMELOCK
        )));
    }
    if policy == TimelockPolicy::MaximumOnly && value != MAX_RELATIVE_TIMELOCK {
        return Err(LedgerError::ContractViolation(format!(
            "Timelock {} not allowed: only {} is accepted",
            value, MAX_RELATIVE_TIMELOCK
        )));
    }
    Ok(value)
}

/// Zero-input transaction carrying `outputs`
pub fn make_coinbase(outputs: Vec<Output>) -> Transaction {
    Transaction { inputs: vec![], outputs: reindex(outputs) }
}

/// MakeSpendingTransaction: 𝒪 × 𝒪𝓊𝓉 × 𝒪𝓊𝓉* × 𝒜 → 𝒯𝒳
///
/// Single input spending `prevout`, whose claim is exactly what
/// `authorization` presents. `Authorization::satisfying(spent_output)` gives
/// the spender that presents the required key set.
///
/// `spent_output` must be the output `prevout` names.
pub fn make_spending_transaction(
    prevout: OutPoint,
    spent_output: &Output,
    new_outputs: Vec<Output>,
    authorization: &Authorization,
) -> Result<Transaction> {
    if prevout.index != spent_output.index {
        return Err(LedgerError::ContractViolation(format!(
            "{} does not name output #{}",
            prevout, spent_output.index
        )));
    }
    Ok(Transaction {
        inputs: vec![Input {
            prevout,
            sighash: authorization.sighash,
            claimed_signers: authorization.signers.clone(),
            revealed_preimage: authorization.preimage,
        }],
        outputs: reindex(new_outputs),
    })
}

fn reindex(outputs: Vec<Output>) -> Vec<Output> {
    outputs
        .into_iter()
        .enumerate()
        .map(|(i, output)| Output { index: i as Natural, ..output })
        .collect()
}

/// CheckTransaction: 𝒯𝒳 → {valid, invalid}
///
/// A transaction tx = (ins, outs) is valid if and only if:
/// 1. |outs| > 0
/// 2. |ins| ≤ MAX_INPUTS ∧ |outs| ≤ MAX_OUTPUTS
/// 3. ∀o ∈ outs: o.index = position(o) ∧ o.amount ≤ MAX_AMOUNT
/// 4. ∀o ∈ outs: |keys(o)| ≤ MAX_MULTISIG_KEYS ∧ timelock(o) ≤ MAX_RELATIVE_TIMELOCK
pub fn check_transaction(tx: &Transaction) -> Result<ValidationResult> {
    if tx.outputs.is_empty() {
        return Ok(ValidationResult::Invalid("Empty outputs".to_string()));
    }

    if tx.inputs.len() > MAX_INPUTS {
        return Ok(ValidationResult::Invalid(format!(
            "Too many inputs: {}",
            tx.inputs.len()
        )));
    }

    if tx.outputs.len() > MAX_OUTPUTS {
        return Ok(ValidationResult::Invalid(format!(
            "Too many outputs: {}",
            tx.outputs.len()
        )));
    }

    for (i, output) in tx.outputs.iter().enumerate() {
        if output.index != i as Natural {
            return Ok(ValidationResult::Invalid(format!(
                "Output at position {} carries index {}",
                i, output.index
            )));
        }
        if output.amount > MAX_AMOUNT {
            return Ok(ValidationResult::Invalid(format!(
                "Invalid output amount {} at index {}",
                output.amount, i
            )));
        }
        if output.authorized_keys().len() > MAX_MULTISIG_KEYS {
            return Ok(ValidationResult::Invalid(format!(
                "Too many keys at index {}",
                i
            )));
        }
        if output.timelock().is_some_and(|t| t > MAX_RELATIVE_TIMELOCK) {
            return Ok(ValidationResult::Invalid(format!(
                "Timelock out of range at index {}",
                i
            )));
        }
    }

    Ok(ValidationResult::Valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(name: &str) -> Key {
        Key::from(name)
    }

    #[test]
    fn test_make_output_p2wkh() {
        let output = make_output(OutputType::P2wkh, vec![k("A")], 100).unwrap();
        assert_eq!(output.index, 0);
        assert_eq!(output.output_type(), OutputType::P2wkh);
        assert_eq!(output.authorized_keys(), &[k("A")]);
        assert_eq!(output.timelock(), None);
        assert_eq!(output.required_preimage(), None);
        assert_eq!(output.amount, 100);
    }

    #[test]
    fn test_make_output_timelock_defaults_to_maximum() {
        let output =
            make_output(OutputType::MultisigWithTimelock, vec![k("A"), k("B")], 1).unwrap();
        assert_eq!(output.timelock(), Some(MAX_RELATIVE_TIMELOCK));
    }

    #[test]
    fn test_make_output_hash_lock_needs_preimage() {
        let result = make_output(OutputType::HashLock, vec![], 1);
        assert!(matches!(result, Err(LedgerError::ContractViolation(_))));
    }

    #[test]
    fn test_create_output_hash_lock() {
        let h = HashValue([1; 32]);
        let output = create_output(
            OutputType::HashLock,
            vec![],
            None,
            Some(h),
            10,
            TimelockPolicy::Arbitrary,
        )
        .unwrap();
        assert_eq!(output.required_preimage(), Some(&h));
        assert!(output.authorized_keys().is_empty());
    }

    #[test]
    fn test_create_output_p2wkh_key_count() {
        for keys in [vec![], vec![k("A"), k("B")]] {
            let result = make_output(OutputType::P2wkh, keys, 1);
            assert!(matches!(result, Err(LedgerError::ContractViolation(_))));
        }
    }

    #[test]
    fn test_create_output_multisig_empty() {
        let result = make_output(OutputType::Multisig, vec![], 1);
        assert!(matches!(result, Err(LedgerError::ContractViolation(_))));
    }

    #[test]
    fn test_create_output_multisig_too_many_keys() {
        let keys = (0..=MAX_MULTISIG_KEYS).map(|i| Key::new(vec![i as u8])).collect();
        let result = make_output(OutputType::Multisig, keys, 1);
        assert!(matches!(result, Err(LedgerError::ContractViolation(_))));
    }

    #[test]
    fn test_create_output_hash_lock_rejects_keys() {
        let result = create_output(
            OutputType::HashLock,
            vec![k("A")],
            None,
            Some(HashValue([0; 32])),
            1,
            TimelockPolicy::Arbitrary,
        );
        assert!(matches!(result, Err(LedgerError::ContractViolation(_))));
    }

    #[test]
    fn test_create_output_rejects_stray_fields() {
        let stray_timelock = create_output(
            OutputType::Multisig,
            vec![k("A")],
            Some(5),
            None,
            1,
            TimelockPolicy::Arbitrary,
        );
        assert!(matches!(stray_timelock, Err(LedgerError::ContractViolation(_))));

        let stray_preimage = create_output(
            OutputType::P2wkh,
            vec![k("A")],
            None,
            Some(HashValue([0; 32])),
            1,
            TimelockPolicy::Arbitrary,
        );
        assert!(matches!(stray_preimage, Err(LedgerError::ContractViolation(_))));
    }

    #[test]
    fn test_create_output_amount_limit() {
        assert!(make_output(OutputType::P2wkh, vec![k("A")], MAX_AMOUNT).is_ok());
        let result = make_output(OutputType::P2wkh, vec![k("A")], MAX_AMOUNT + 1);
        assert!(matches!(result, Err(LedgerError::ContractViolation(_))));
    }

    #[test]
    fn test_resolve_timelock_policies() {
        assert_eq!(resolve_timelock(Some(10), TimelockPolicy::Arbitrary).unwrap(), 10);
        assert_eq!(
            resolve_timelock(None, TimelockPolicy::MaximumOnly).unwrap(),
            MAX_RELATIVE_TIMELOCK
        );
        assert!(resolve_timelock(Some(10), TimelockPolicy::MaximumOnly).is_err());
        assert!(resolve_timelock(Some(MAX_RELATIVE_TIMELOCK + 1), TimelockPolicy::Arbitrary).is_err());
    }

    #[test]
    fn test_make_coinbase_reindexes() {
        let a = make_output(OutputType::P2wkh, vec![k("A")], 1).unwrap();
        let b = make_output(OutputType::P2wkh, vec![k("B")], 2).unwrap();
        let tx = make_coinbase(vec![a, b]);
        assert!(tx.is_coinbase());
        assert_eq!(tx.outputs[0].index, 0);
        assert_eq!(tx.outputs[1].index, 1);
        assert_eq!(check_transaction(&tx).unwrap(), ValidationResult::Valid);
    }

    #[test]
    fn test_make_spending_transaction_uses_authorization() {
        let spent = make_output(OutputType::P2wkh, vec![k("A")], 100).unwrap();
        let new_output = make_output(OutputType::Multisig, vec![k("B"), k("C")], 100).unwrap();
        let prevout = OutPoint::new(TxId(1), 0);

        let tx = make_spending_transaction(
            prevout,
            &spent,
            vec![new_output.clone()],
            &Authorization::satisfying(&spent),
        )
        .unwrap();
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.inputs[0].prevout, prevout);
        assert_eq!(tx.inputs[0].claimed_signers, vec![k("A")]);
        assert_eq!(tx.inputs[0].revealed_preimage, None);
        assert_eq!(tx.outputs, vec![new_output]);

        let wrong = make_spending_transaction(
            prevout,
            &spent,
            vec![],
            &Authorization::signed_by(vec![k("B")]).with_sighash(SighashFlag::Single),
        )
        .unwrap();
        assert_eq!(wrong.inputs[0].claimed_signers, vec![k("B")]);
        assert_eq!(wrong.inputs[0].sighash, SighashFlag::Single);
    }

    #[test]
    fn test_make_spending_transaction_rejects_mismatched_prevout() {
        let spent = make_output(OutputType::P2wkh, vec![k("A")], 100).unwrap();
        let result = make_spending_transaction(
            OutPoint::new(TxId(1), 3),
            &spent,
            vec![],
            &Authorization::satisfying(&spent),
        );
        assert!(matches!(result, Err(LedgerError::ContractViolation(_))));
    }

    #[test]
    fn test_check_transaction_empty_outputs() {
        let tx = Transaction { inputs: vec![], outputs: vec![] };
        assert!(matches!(
            check_transaction(&tx).unwrap(),
            ValidationResult::Invalid(_)
        ));
    }

    #[test]
    fn test_check_transaction_bad_index() {
        let mut output = make_output(OutputType::P2wkh, vec![k("A")], 1).unwrap();
        output.index = 3;
        let tx = Transaction { inputs: vec![], outputs: vec![output] };
        assert!(matches!(
            check_transaction(&tx).unwrap(),
            ValidationResult::Invalid(_)
        ));
    }

    #[test]
    fn test_check_transaction_hand_built_timelock() {
        let tx = Transaction {
            inputs: vec![],
            outputs: vec![Output {
                index: 0,
                condition: SpendCondition::MultisigWithTimelock {
                    keys: KeySet::new(vec![k("A")]).unwrap(),
                    timelock: MAX_RELATIVE_TIMELOCK + 1,
                },
                amount: 1,
            }],
        };
        assert!(matches!(
            check_transaction(&tx).unwrap(),
            ValidationResult::Invalid(_)
        ));
    }

    #[test]
    fn test_check_transaction_too_many_outputs() {
        let output = make_output(OutputType::P2wkh, vec![k("A")], 1).unwrap();
        let tx = make_coinbase(vec![output; MAX_OUTPUTS + 1]);
        assert!(matches!(
            check_transaction(&tx).unwrap(),
            ValidationResult::Invalid(_)
        ));
    }
}
