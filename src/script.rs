//! Spend-condition verification for the fixed output catalogue

use crate::oracle::{SpendOracle, StructuralOracle};
use crate::types::*;

/// Heights a spend is judged against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendContext {
    /// Height at which the spent output's transaction was confirmed
    pub confirmed_height: Natural,
    /// Height at which the spending transaction would confirm
    pub spend_height: Natural,
}

impl SpendContext {
    pub fn new(confirmed_height: Natural, spend_height: Natural) -> Self {
        Self { confirmed_height, spend_height }
    }

    /// Blocks elapsed since the output became spendable
    pub fn age(&self) -> Natural {
        self.spend_height.saturating_sub(self.confirmed_height)
    }
}

/// VerifySpend: 𝒪𝓊𝓉 × ℐ × 𝒞𝓉𝓍 → {true, false}
///
/// For output o with condition c and input i:
/// - P2wkh(k): i.claimed_signers = [k]
/// - Multisig(K): ∀k ∈ K: k ∈ i.claimed_signers
/// - MultisigWithTimelock(K, t): Multisig(K) ∧ age ≥ t
/// - HashLock(h): i.revealed_preimage = h
///
/// Pure and total: a mismatch is `false`, never an error.
pub fn verify_spend(output: &Output, input: &Input, context: &SpendContext) -> bool {
    verify_spend_with(&StructuralOracle, output, input, context)
}

/// [`verify_spend`] with the key and preimage comparisons delegated to `oracle`
pub fn verify_spend_with<O: SpendOracle + ?Sized>(
    oracle: &O,
    output: &Output,
    input: &Input,
    context: &SpendContext,
) -> bool {
    match &output.condition {
        SpendCondition::P2wkh { key } => {
            input.claimed_signers.len() == 1
                && oracle.signers_satisfy(std::slice::from_ref(key), &input.claimed_signers)
        }
        SpendCondition::Multisig { keys } => {
            oracle.signers_satisfy(keys.keys(), &input.claimed_signers)
        }
        SpendCondition::MultisigWithTimelock { keys, timelock } => {
            oracle.signers_satisfy(keys.keys(), &input.claimed_signers)
                && timelock_satisfied(*timelock, context)
        }
        SpendCondition::HashLock { preimage } => input
            .revealed_preimage
            .as_ref()
            .is_some_and(|revealed| oracle.preimage_matches(preimage, revealed)),
    }
}

/// Relative timelock check: spend_height - confirmed_height ≥ timelock
pub fn timelock_satisfied(timelock: Natural, context: &SpendContext) -> bool {
    context.age() >= timelock
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{sha256_lock, Sha256Oracle};

    fn output(condition: SpendCondition) -> Output {
        Output { index: 0, condition, amount: 100 }
    }

    fn input(signers: &[&str], preimage: Option<HashValue>) -> Input {
        Input {
            prevout: OutPoint::new(TxId(1), 0),
            sighash: SighashFlag::All,
            claimed_signers: signers.iter().map(|s| Key::from(*s)).collect(),
            revealed_preimage: preimage,
        }
    }

    fn keys(names: &[&str]) -> KeySet {
        KeySet::new(names.iter().map(|s| Key::from(*s)).collect()).unwrap()
    }

    const CTX: SpendContext = SpendContext { confirmed_height: 1, spend_height: 2 };

    #[test]
    fn test_p2wkh_exact_key() {
        let o = output(SpendCondition::P2wkh { key: Key::from("A") });
        assert!(verify_spend(&o, &input(&["A"], None), &CTX));
    }

    #[test]
    fn test_p2wkh_rejects_other_sequences() {
        let o = output(SpendCondition::P2wkh { key: Key::from("A") });
        assert!(!verify_spend(&o, &input(&["B"], None), &CTX));
        assert!(!verify_spend(&o, &input(&[], None), &CTX));
        assert!(!verify_spend(&o, &input(&["A", "A"], None), &CTX));
        assert!(!verify_spend(&o, &input(&["A", "B"], None), &CTX));
    }

    #[test]
    fn test_multisig_any_order() {
        let o = output(SpendCondition::Multisig { keys: keys(&["A", "B"]) });
        assert!(verify_spend(&o, &input(&["A", "B"], None), &CTX));
        assert!(verify_spend(&o, &input(&["B", "A"], None), &CTX));
    }

    #[test]
    fn test_multisig_missing_key() {
        let o = output(SpendCondition::Multisig { keys: keys(&["A", "B"]) });
        assert!(!verify_spend(&o, &input(&["A"], None), &CTX));
        assert!(!verify_spend(&o, &input(&["B"], None), &CTX));
        assert!(!verify_spend(&o, &input(&["B", "C"], None), &CTX));
    }

    #[test]
    fn test_timelocked_multisig() {
        let o = output(SpendCondition::MultisigWithTimelock {
            keys: keys(&["A", "B"]),
            timelock: 3,
        });
        let signed = input(&["B", "A"], None);

        assert!(!verify_spend(&o, &signed, &SpendContext::new(5, 7)));
        assert!(verify_spend(&o, &signed, &SpendContext::new(5, 8)));
        assert!(verify_spend(&o, &signed, &SpendContext::new(5, 100)));
        // Elapsed time never substitutes for a missing signer
        assert!(!verify_spend(&o, &input(&["A"], None), &SpendContext::new(5, 100)));
    }

    #[test]
    fn test_timelock_zero_always_elapsed() {
        assert!(timelock_satisfied(0, &SpendContext::new(4, 4)));
    }

    #[test]
    fn test_age_saturates() {
        assert_eq!(SpendContext::new(10, 3).age(), 0);
    }

    #[test]
    fn test_hash_lock() {
        let h = HashValue([4; 32]);
        let o = output(SpendCondition::HashLock { preimage: h });
        assert!(verify_spend(&o, &input(&[], Some(h)), &CTX));
        assert!(!verify_spend(&o, &input(&[], Some(HashValue([5; 32]))), &CTX));
        assert!(!verify_spend(&o, &input(&[], None), &CTX));
    }

    #[test]
    fn test_hash_lock_ignores_signers() {
        let h = HashValue([4; 32]);
        let o = output(SpendCondition::HashLock { preimage: h });
        assert!(!verify_spend(&o, &input(&["A"], None), &CTX));
    }

    #[test]
    fn test_sha256_oracle_hash_lock() {
        let secret = HashValue([2; 32]);
        let o = output(SpendCondition::HashLock { preimage: sha256_lock(&secret) });
        assert!(verify_spend_with(&Sha256Oracle, &o, &input(&[], Some(secret)), &CTX));
        assert!(!verify_spend(&o, &input(&[], Some(secret)), &CTX));
    }
}
