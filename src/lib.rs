//! # Spend-Ledger
//!
//! Transaction lifecycle and spend-condition authorization without real
//! cryptography.
//!
//! Contract protocols built on typed outputs (single key, all-of-N keys,
//! all-of-N keys behind a relative timelock, hash locks) can be reasoned
//! about here purely in terms of *which* conditions must hold. A spend is a
//! structural claim; the ledger admits it when the claim matches what the
//! referenced output requires.
//!
//! ## Architecture
//!
//! The crate is layered, leaves first:
//! - Spend-condition model (`script`, `oracle`)
//! - Transaction and output factory (`transaction`)
//! - Ledger state (`ledger`)
//! - Transition engine (`mempool`, `block`, `transition`)
//!
//! plus an exploration harness (`explore`) that enumerates every enabled
//! transition for model-based testing.
//!
//! ## Design Principles
//!
//! 1. **Explicit State**: every transition takes the ledger state as a value; nothing is global
//! 2. **Atomic Transitions**: a rejected transition changes nothing
//! 3. **Typed Outcomes**: unmet preconditions are `LedgerError` values, never panics
//! 4. **Closed Catalogue**: each output type carries exactly the fields it needs
//!
//! ## Usage
//!
//! ```rust
//! use spend_ledger::Ledger;
//! use spend_ledger::types::*;
//!
//! let mut ledger = Ledger::new();
//! let output = ledger
//!     .create_output(OutputType::P2wkh, vec![Key::from("A")], None, None, 100)
//!     .unwrap();
//! ledger.create_coinbase(TxId(1), output).unwrap();
//! ledger.confirm(TxId(1)).unwrap();
//! assert_eq!(ledger.chain_height(), 1);
//! ```

pub mod types;
pub mod constants;
pub mod config;
pub mod keys;
pub mod oracle;
pub mod script;
pub mod transaction;
pub mod ledger;
pub mod mempool;
pub mod block;
pub mod transition;
pub mod explore;
pub mod shared;
pub mod error;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use ledger::LedgerState;
pub use shared::SharedLedger;
pub use transition::Action;

/// Ledger facade: one state, one configuration, the external interface
///
/// # Examples
///
/// ```
/// use spend_ledger::{Ledger, LedgerError};
/// use spend_ledger::types::*;
///
/// let mut ledger = Ledger::new();
///
/// // Fund key A
/// let funding = ledger
///     .create_output(OutputType::P2wkh, vec![Key::from("A")], None, None, 100)
///     .unwrap();
/// ledger.create_coinbase(TxId(1), funding).unwrap();
/// ledger.confirm(TxId(1)).unwrap();
///
/// // A moves the funds into a 2-of-2 between B and C
/// let channel = ledger
///     .create_output(OutputType::Multisig, vec![Key::from("B"), Key::from("C")], None, None, 100)
///     .unwrap();
/// let prevout = OutPoint::new(TxId(1), 0);
/// let authorization = Authorization::signed_by(vec![Key::from("A")]);
/// ledger.create_spend(TxId(2), prevout, &authorization, channel.clone()).unwrap();
///
/// // B alone cannot claim A's output
/// let result = ledger.create_spend(
///     TxId(3),
///     prevout,
///     &Authorization::signed_by(vec![Key::from("B")]),
///     channel,
/// );
/// assert_eq!(result, Err(LedgerError::ConditionNotSatisfied(prevout)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    state: LedgerState,
    config: LedgerConfig,
}

impl Ledger {
    /// Create an empty ledger with the default configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use spend_ledger::Ledger;
    ///
    /// let ledger = Ledger::new();
    /// assert_eq!(ledger.chain_height(), 0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty ledger governed by `config`
    pub fn with_config(config: LedgerConfig) -> Self {
        Self { state: LedgerState::new(), config }
    }

    /// Resume from a saved state, refusing one that breaks an invariant
    pub fn from_state(state: LedgerState, config: LedgerConfig) -> Result<Self> {
        state.check_invariants()?;
        Ok(Self { state, config })
    }

    /// Active configuration
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Current ledger state
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Consume the ledger, keeping its state
    pub fn into_state(self) -> LedgerState {
        self.state
    }

    /// Build an output under this ledger's timelock policy
    ///
    /// # Examples
    ///
    /// ```
    /// use spend_ledger::{Ledger, LedgerError};
    /// use spend_ledger::types::*;
    ///
    /// let ledger = Ledger::new();
    ///
    /// let lock = ledger
    ///     .create_output(OutputType::HashLock, vec![], None, Some(HashValue([7; 32])), 50)
    ///     .unwrap();
    /// assert_eq!(lock.required_preimage(), Some(&HashValue([7; 32])));
    ///
    /// // A hash lock without a preimage cannot be built
    /// let missing = ledger.create_output(OutputType::HashLock, vec![], None, None, 50);
    /// assert!(matches!(missing, Err(LedgerError::ContractViolation(_))));
    /// ```
    pub fn create_output(
        &self,
        output_type: OutputType,
        keys: Vec<Key>,
        timelock: Option<Natural>,
        preimage: Option<HashValue>,
        amount: Amount,
    ) -> Result<Output> {
        transaction::create_output(output_type, keys, timelock, preimage, amount, self.config.timelock)
    }

    /// Admit a coinbase transaction carrying `output` to the mempool
    pub fn create_coinbase(&mut self, id: TxId, output: Output) -> Result<TxId> {
        mempool::accept_coinbase(&mut self.state, id, output)
    }

    /// Confirm a pending transaction in a new block
    pub fn confirm(&mut self, id: TxId) -> Result<()> {
        block::confirm_pending(&mut self.state, id, &self.config).map(|_| ())
    }

    /// Admit a transaction spending `prevout` into `output`
    pub fn create_spend(
        &mut self,
        id: TxId,
        prevout: OutPoint,
        authorization: &Authorization,
        output: Output,
    ) -> Result<TxId> {
        mempool::accept_spend(&mut self.state, id, prevout, authorization, output, &self.config)
    }

    /// [`Ledger::create_spend`] with spend conditions judged by `oracle`
    pub fn create_spend_with<O: oracle::SpendOracle + ?Sized>(
        &mut self,
        oracle: &O,
        id: TxId,
        prevout: OutPoint,
        authorization: &Authorization,
        output: Output,
    ) -> Result<TxId> {
        mempool::accept_spend_with(
            oracle,
            &mut self.state,
            id,
            prevout,
            authorization,
            output,
            &self.config,
        )
    }

    /// Apply one transition given as a value; a rejected action changes nothing
    pub fn apply(&mut self, action: &Action) -> Result<()> {
        transition::step(&mut self.state, action, &self.config)
    }

    /// Output `index` of transaction `txid`, pending or published
    pub fn get_output(&self, txid: TxId, index: Natural) -> Option<&Output> {
        self.state.get_output(&OutPoint::new(txid, index))
    }

    /// True once `txid` has been confirmed
    pub fn is_published(&self, txid: TxId) -> bool {
        self.state.is_published(txid)
    }

    /// True while `txid` waits in the mempool
    pub fn is_pending(&self, txid: TxId) -> bool {
        self.state.is_pending(txid)
    }

    /// Number of confirmed blocks
    pub fn chain_height(&self) -> Natural {
        self.state.chain_height()
    }

    /// Registered transaction `txid`
    pub fn transaction(&self, txid: TxId) -> Option<&Transaction> {
        self.state.transaction(txid)
    }
}
