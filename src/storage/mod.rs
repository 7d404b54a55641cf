//! Storage layer
//!
//! `LedgerStore` is the persistence contract the executor, assembler and
//! allocator are written against. Two independent backends implement it:
//! `MemoryStore` for tests and ephemeral runs, `SledStore` for durable
//! nodes. Pending transactions are part of the contract; `PendingPool` holds
//! them in memory and carries the duplicate-detection rules both backends share.

pub mod memory;
pub mod memory_pool;
pub mod sled_store;

use crate::core::{Account, AccountType, Block, BlockInfo, Transaction};
use crate::error::Result;

pub use memory::MemoryStore;
pub use memory_pool::{find_duplicate, PendingPool};
pub use sled_store::SledStore;

/// Persistence contract for account state, blocks, transactions and the
/// service identity.
///
/// Implementations only store what they are told; every balance rule lives in
/// the `TransactionExecutor`. Calls are individually atomic but a sequence of
/// calls is not.
pub trait LedgerStore: Send + Sync {
    /// Registers a zero-balance account; fails if the address is already known
    fn create_account(&self, address: &str) -> Result<Account>;

    fn get_account(&self, address: &str) -> Result<Option<Account>>;

    fn account_count(&self) -> Result<u64>;

    /// Every known account, ordered by address
    fn accounts(&self) -> Result<Vec<Account>>;

    /// Overwrites `balance` (or `locked_balance` when `locked`), persists `tx`
    /// by id and records it in the account history
    fn update_balance(
        &self,
        address: &str,
        new_balance: u64,
        tx: &Transaction,
        locked: bool,
    ) -> Result<()>;

    /// Number of committed blocks, i.e. the height of the next block
    fn block_height(&self) -> Result<u64>;

    fn get_block(&self, height: u64) -> Result<Option<Block>>;

    fn get_block_info(&self, height: u64) -> Result<Option<BlockInfo>> {
        Ok(self.get_block(height)?.map(|block| block.info()))
    }

    fn get_transaction(&self, txid: &str) -> Result<Option<Transaction>>;

    fn add_pending(&self, tx: Transaction) -> Result<()>;

    /// Pending transactions in arrival order
    fn list_pending(&self) -> Result<Vec<Transaction>>;

    /// Appends `block` at `block_height()`, persists each of its transactions
    /// tagged with the height, and drops exactly those ids from the pending set
    fn commit_block(&self, block: &Block) -> Result<()>;

    fn on_account_type_changed(&self, address: &str, new_type: Option<AccountType>)
        -> Result<()>;

    /// Adds or removes one `from -> to` support edge
    fn on_relationship_changed(&self, from: &str, to: &str, added: bool) -> Result<()>;

    /// Active support edges as `(from, to)`, ordered
    fn relationships(&self) -> Result<Vec<(String, String)>>;

    fn get_service_address(&self) -> Result<Option<String>>;

    /// Stores the service identity; it can be set once only
    fn set_service_address(&self, address: &str) -> Result<()>;
}
