//! Ledger limits and timelock bounds

/// Base units per coin
pub const UNITS_PER_COIN: u64 = 100_000_000;

/// Maximum amount any single output may carry: 21,000,000 coins in base units
pub const MAX_AMOUNT: u64 = 21_000_000 * UNITS_PER_COIN;

/// Largest relative timelock, in blocks (CSV encodes the delta in 16 bits)
pub const MAX_RELATIVE_TIMELOCK: u64 = 0xffff;

/// Maximum number of keys in an all-of-N condition
pub const MAX_MULTISIG_KEYS: usize = 20;

/// Maximum number of inputs per transaction
pub const MAX_INPUTS: usize = 1000;

/// Maximum number of outputs per transaction
pub const MAX_OUTPUTS: usize = 1000;

/// Height of an empty ledger
pub const GENESIS_HEIGHT: u64 = 0;
