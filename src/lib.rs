//! # Support Ledger - My Single-Authority Value Ledger
//!
//! This is a centralized ledger I run as its own authority: accounts hold a
//! spendable balance and a locked balance, and a timer bundles every queued
//! transaction into numbered blocks.
//! When I come back to this code, here's what I need to remember:
//!
//! ## What I Built
//! - **Dual Balances**: Locked funds back support edges and generator claims
//! - **Transaction State Machine**: Per-kind rules applied strictly in block order
//! - **Pending Pool**: One in-flight support per pair, one claim per address
//! - **Block Assembly**: Coinbase, then rewards, then pending, single-flight
//! - **Mining Daemon**: Timer thread plus on-demand triggers
//! - **Address Allocation**: Deterministic addresses issued one at a time
//!
//! ## How I Organized My Code
//! - `core/`: Accounts, transactions, blocks, executor, assembler, daemon, ledger facade
//! - `wallet/`: Address derivation, validation and allocation
//! - `storage/`: The `LedgerStore` trait, the in-memory store and the Sled store
//! - `config/`: Ledger economics and process-wide settings
//! - `utils/`: Hashing, encoding and bincode helpers
//! - `cli/`: Command-line interface for every ledger operation
//!
//! ## Key Design Decisions I Made
//! - No proof-of-work and no peers: this node is the only authority
//! - Executor and assembler only see the `LedgerStore` trait
//! - Rejected transactions stay in their block as no-ops
//! - Used Sled embedded database for the durable store
//!
//! ## When I Need to Understand Something
//! 1. Start with `main.rs` to see the CLI commands
//! 2. Look at `core/ledger.rs` for intent validation
//! 3. Check `core/executor.rs` for the balance rules
//! 4. Review `core/assembler.rs` for how a block is built

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, LedgerConfig, GLOBAL_CONFIG};
pub use crate::core::{
    Account, AccountType, Block, BlockAssembler, BlockInfo, DaemonState, ExecutionOutcome, Ledger,
    LedgerStats, LotteryRewardDistributor, MiningDaemon, NoRewards, RewardAssignment,
    RewardDistributor, RewardOutcome, Transaction, TransactionExecutor, TxKind,
};
pub use error::{LedgerError, Result};
pub use storage::{LedgerStore, MemoryStore, PendingPool, SledStore};
pub use utils::{base58_decode, base58_encode, current_timestamp, hash160, sha256_digest};
pub use wallet::{
    validate_address, AddressAllocator, AddressGenerator, SeededAddressGenerator,
    ADDRESS_CHECK_SUM_LEN,
};
