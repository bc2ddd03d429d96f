//! Key source and key hashing
//!
//! The ledger treats keys as opaque byte strings. This module supplies a
//! deterministic source of realistic ones: compressed secp256k1 public keys
//! derived from small integer seeds, and the HASH160 commitment a P2WKH
//! output would carry on a real chain.

use crate::error::{LedgerError, Result};
use crate::types::Key;
use ripemd::Ripemd160;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};

/// Derive the compressed public key for `seed`.
///
/// Distinct seeds give distinct keys; the same seed always gives the same key.
pub fn key_from_seed(seed: u64) -> Result<Key> {
    let mut secret = [0u8; 32];
    // Non-zero marker keeps the scalar valid for every seed, including 0
    secret[23] = 1;
    secret[24..].copy_from_slice(&seed.to_be_bytes());

    let secret_key = SecretKey::from_slice(&secret)
        .map_err(|e| LedgerError::ContractViolation(format!("Invalid key seed {}: {}", seed, e)))?;
    let secp = Secp256k1::signing_only();
    let public_key = PublicKey::from_secret_key(&secp, &secret_key);
    Ok(Key(public_key.serialize().to_vec()))
}

/// Derive `count` keys from consecutive seeds starting at zero
pub fn key_ring(count: usize) -> Result<Vec<Key>> {
    (0..count as u64).map(key_from_seed).collect()
}

/// HASH160: RIPEMD160(SHA256(x))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha256_hash = Sha256::digest(data);
    let ripemd160_hash = Ripemd160::digest(sha256_hash);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripemd160_hash);
    out
}

impl Key {
    /// Witness key hash of this key
    pub fn key_hash(&self) -> [u8; 20] {
        hash160(self.as_bytes())
    }

    /// True if the bytes parse as a secp256k1 public key
    pub fn is_valid_public_key(&self) -> bool {
        PublicKey::from_slice(self.as_bytes()).is_ok()
    }
}
