//! Core ledger types for spend-condition validation

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// Amount of value carried by an output
pub type Amount = u64;

/// Transaction id: assigned by the caller at creation, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId(pub Natural);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Opaque, comparable key identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key(pub ByteString);

impl Key {
    pub fn new(bytes: impl Into<ByteString>) -> Self {
        Key(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key(name.as_bytes().to_vec())
    }
}

/// Opaque, comparable hash value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HashValue(pub Hash);

/// OutPoint: 𝒪 = TxId × ℕ
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: TxId,
    pub index: Natural,
}

impl OutPoint {
    pub fn new(txid: TxId, index: Natural) -> Self {
        Self { txid, index }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.index)
    }
}

/// Which parts of the transaction a signature claims to cover.
///
/// Carried structurally on every input; it never changes admissibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SighashFlag {
    #[default]
    All,
    None,
    Single,
    AnyoneCanPay,
}

/// Fixed output catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    P2wkh,
    Multisig,
    MultisigWithTimelock,
    HashLock,
}

impl OutputType {
    pub const ALL: [OutputType; 4] = [
        OutputType::P2wkh,
        OutputType::Multisig,
        OutputType::MultisigWithTimelock,
        OutputType::HashLock,
    ];
}

/// Ordered, non-empty set of distinct keys
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Key>", into = "Vec<Key>")]
pub struct KeySet(Vec<Key>);

impl KeySet {
    pub fn new(keys: Vec<Key>) -> Result<Self> {
        if keys.is_empty() {
            return Err(LedgerError::ContractViolation(
                "Key set must not be empty".to_string(),
            ));
        }
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].contains(key) {
                return Err(LedgerError::ContractViolation(format!(
                    "Duplicate key at position {}",
                    i
                )));
            }
        }
        Ok(KeySet(keys))
    }

    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.0.contains(key)
    }
}

impl TryFrom<Vec<Key>> for KeySet {
    type Error = LedgerError;

    fn try_from(keys: Vec<Key>) -> Result<Self> {
        KeySet::new(keys)
    }
}

impl From<KeySet> for Vec<Key> {
    fn from(set: KeySet) -> Self {
        set.0
    }
}

/// Spend condition: one case per output type, carrying only what that type needs
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpendCondition {
    P2wkh { key: Key },
    Multisig { keys: KeySet },
    MultisigWithTimelock { keys: KeySet, timelock: Natural },
    HashLock { preimage: HashValue },
}

impl SpendCondition {
    pub fn output_type(&self) -> OutputType {
        match self {
            SpendCondition::P2wkh { .. } => OutputType::P2wkh,
            SpendCondition::Multisig { .. } => OutputType::Multisig,
            SpendCondition::MultisigWithTimelock { .. } => OutputType::MultisigWithTimelock,
            SpendCondition::HashLock { .. } => OutputType::HashLock,
        }
    }

    /// Keys that must sign; empty for hash locks
    pub fn authorized_keys(&self) -> &[Key] {
        match self {
            SpendCondition::P2wkh { key } => std::slice::from_ref(key),
            SpendCondition::Multisig { keys } => keys.keys(),
            SpendCondition::MultisigWithTimelock { keys, .. } => keys.keys(),
            SpendCondition::HashLock { .. } => &[],
        }
    }

    pub fn timelock(&self) -> Option<Natural> {
        match self {
            SpendCondition::MultisigWithTimelock { timelock, .. } => Some(*timelock),
            _ => None,
        }
    }

    pub fn required_preimage(&self) -> Option<&HashValue> {
        match self {
            SpendCondition::HashLock { preimage } => Some(preimage),
            _ => None,
        }
    }
}

/// Transaction Output: index × condition × amount
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Output {
    pub index: Natural,
    pub condition: SpendCondition,
    pub amount: Amount,
}

impl Output {
    pub fn output_type(&self) -> OutputType {
        self.condition.output_type()
    }

    pub fn authorized_keys(&self) -> &[Key] {
        self.condition.authorized_keys()
    }

    pub fn timelock(&self) -> Option<Natural> {
        self.condition.timelock()
    }

    pub fn required_preimage(&self) -> Option<&HashValue> {
        self.condition.required_preimage()
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.condition {
            SpendCondition::P2wkh { key } => {
                write!(f, "#{} p2wkh(", self.index)?;
                for byte in key.key_hash() {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, ") {}", self.amount)
            }
            SpendCondition::Multisig { keys } => {
                write!(f, "#{} multisig({}) {}", self.index, keys.len(), self.amount)
            }
            SpendCondition::MultisigWithTimelock { keys, timelock } => write!(
                f,
                "#{} multisig({}, csv {}) {}",
                self.index,
                keys.len(),
                timelock,
                self.amount
            ),
            SpendCondition::HashLock { .. } => {
                write!(f, "#{} hashlock {}", self.index, self.amount)
            }
        }
    }
}

/// Transaction Input: a structural claim that the referenced condition holds
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Input {
    pub prevout: OutPoint,
    pub sighash: SighashFlag,
    pub claimed_signers: Vec<Key>,
    pub revealed_preimage: Option<HashValue>,
}

/// Transaction: inputs × outputs. No inputs means coinbase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

impl Transaction {
    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn output(&self, index: Natural) -> Option<&Output> {
        usize::try_from(index).ok().and_then(|i| self.outputs.get(i))
    }
}

/// What a spender presents when claiming an output
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Authorization {
    pub signers: Vec<Key>,
    pub preimage: Option<HashValue>,
    pub sighash: SighashFlag,
}

impl Authorization {
    /// Present exactly what `output` asks for
    pub fn satisfying(output: &Output) -> Self {
        Self {
            signers: output.authorized_keys().to_vec(),
            preimage: output.required_preimage().copied(),
            sighash: SighashFlag::All,
        }
    }

    pub fn signed_by(signers: Vec<Key>) -> Self {
        Self {
            signers,
            ..Self::default()
        }
    }

    pub fn revealing(preimage: HashValue) -> Self {
        Self {
            preimage: Some(preimage),
            ..Self::default()
        }
    }

    pub fn with_sighash(mut self, sighash: SighashFlag) -> Self {
        self.sighash = sighash;
        self
    }
}

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}
