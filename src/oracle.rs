//! Verification oracles behind the spend-condition predicate
//!
//! The predicate in [`crate::script`] never compares keys or preimages
//! itself; it asks a [`SpendOracle`]. [`StructuralOracle`] is the reference
//! behaviour (plain equality). [`Sha256Oracle`] reads a hash lock's stored
//! value as a SHA-256 digest and checks the revealed value against it.

use crate::types::{HashValue, Key};
use sha2::{Digest, Sha256};

pub trait SpendOracle {
    /// Every required key is vouched for by the claimed signers
    fn signers_satisfy(&self, required: &[Key], claimed: &[Key]) -> bool;

    /// The revealed value opens the stored lock
    fn preimage_matches(&self, required: &HashValue, revealed: &HashValue) -> bool;
}

/// Equality-only oracle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructuralOracle;

impl SpendOracle for StructuralOracle {
    fn signers_satisfy(&self, required: &[Key], claimed: &[Key]) -> bool {
        required.iter().all(|key| claimed.contains(key))
    }

    fn preimage_matches(&self, required: &HashValue, revealed: &HashValue) -> bool {
        required == revealed
    }
}

/// Hash locks store SHA256(preimage)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256Oracle;

impl SpendOracle for Sha256Oracle {
    fn signers_satisfy(&self, required: &[Key], claimed: &[Key]) -> bool {
        StructuralOracle.signers_satisfy(required, claimed)
    }

    fn preimage_matches(&self, required: &HashValue, revealed: &HashValue) -> bool {
        sha256_lock(revealed) == *required
    }
}

/// Lock value for `preimage` under [`Sha256Oracle`]
pub fn sha256_lock(preimage: &HashValue) -> HashValue {
    let digest = Sha256::digest(preimage.0);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    HashValue(out)
}
