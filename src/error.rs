//! Error types for ledger transitions

use crate::types::{OutPoint, TxId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Transaction id already in use: {0}")]
    DuplicateId(TxId),

    #[error("Transaction is not pending: {0}")]
    NotPending(TxId),

    #[error("Transaction is not eligible for confirmation: {0}")]
    NotEligible(TxId),

    #[error("Referenced output not found: {0}")]
    UnknownOutput(OutPoint),

    #[error("Spend condition not satisfied for {0}")]
    ConditionNotSatisfied(OutPoint),

    #[error("Output already spent: {0}")]
    AlreadySpent(OutPoint),

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
