//! Core ledger functionality
//!
//! This module contains the fundamental ledger components including
//! accounts, transactions, blocks, the transaction state machine, block
//! assembly, the mining daemon and the intent facade that ties them together.

pub mod account;
pub mod assembler;
pub mod block;
pub mod daemon;
pub mod executor;
pub mod ledger;
pub mod monetary;
pub mod reward;
pub mod transaction;

pub use account::{Account, AccountType};
pub use assembler::BlockAssembler;
pub use block::{Block, BlockInfo};
pub use daemon::{DaemonState, MiningDaemon};
pub use executor::{ExecutionOutcome, TransactionExecutor};
pub use ledger::{Ledger, LedgerStats};
pub use monetary::{
    coinbase_reward, ADDRESS_START_BOUNTY, BLOCK_REWARD, BLOCK_TIME_SECS, CLAIM_GENERATOR_AMOUNT,
    DISTRIBUTE_REWARD, GENESIS_BLOCK_REWARD, SUPPORT_COST,
};
pub use reward::{
    LotteryRewardDistributor, NoRewards, RewardAssignment, RewardDistributor, RewardOutcome,
};
pub use transaction::{Transaction, TxKind};
