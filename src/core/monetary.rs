//! Default economics of the ledger
//!
//! All amounts are whole integer units; there is no fractional denomination.
//! These are the values `LedgerConfig::default()` starts from.
//!
//! ## Rewards
//! - **Genesis reward**: paid once, by the coinbase of block 0
//! - **Block reward**: paid by the coinbase of every later block
//! - **Distribution budget**: handed to the reward distributor each block
//!
//! ## Escrow prices
//! - **Claim generator**: locked while an account holds the Generator role
//! - **Support**: locked for each active support edge

/// Seconds between two timer-driven blocks
pub const BLOCK_TIME_SECS: u64 = 60;

/// Coinbase amount for every block after genesis
pub const BLOCK_REWARD: u64 = 1;

/// Coinbase amount for block 0
pub const GENESIS_BLOCK_REWARD: u64 = 1_000_000;

/// Budget passed to the reward distributor for each block
pub const DISTRIBUTE_REWARD: u64 = 1;

/// Amount escrowed by a generator claim
pub const CLAIM_GENERATOR_AMOUNT: u64 = 100;

/// Amount sent from the service account to each newly registered address
pub const ADDRESS_START_BOUNTY: u64 = 50;

/// Amount escrowed by one support edge
pub const SUPPORT_COST: u64 = 1;

/// Coinbase amount for the block at `height`
pub fn coinbase_reward(height: u64, block_reward: u64, genesis_reward: u64) -> u64 {
    if height == 0 {
        genesis_reward
    } else {
        block_reward
    }
}
