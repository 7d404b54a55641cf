//! Test utilities for ledger testing

use crate::config::LedgerConfig;
use crate::core::{Account, AccountType, Block, Ledger, NoRewards, Transaction};
use crate::error::{LedgerError, Result};
use crate::storage::{LedgerStore, MemoryStore, SledStore};
use crate::wallet::SeededAddressGenerator;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_SERVICE_ADDRESS: &str = "SIMservice";

/// Default economics with a short block period and a fixed seed
pub fn test_config() -> LedgerConfig {
    LedgerConfig {
        block_time_secs: 1, // 1 second for fast tests
        address_seed: "testnet".to_string(),
        ..LedgerConfig::default()
    }
}

/// Create a temporary directory for testing
pub fn create_temp_dir() -> Result<TempDir> {
    tempfile::tempdir().map_err(|e| LedgerError::Io(e.to_string()))
}

/// A memory store whose service account already holds the genesis reward.
///
/// The balance is credited directly, so the store is still at height 0.
pub fn funded_store() -> (Arc<MemoryStore>, String) {
    let store = Arc::new(MemoryStore::new());
    let service = fund_service(store.as_ref());
    (store, service)
}

/// Registers the test service address on `store` and credits it the genesis reward
pub fn fund_service<S: LedgerStore>(store: &S) -> String {
    store.create_account(TEST_SERVICE_ADDRESS).unwrap();
    store.set_service_address(TEST_SERVICE_ADDRESS).unwrap();
    let coinbase = Transaction::new_coinbase(TEST_SERVICE_ADDRESS, 1_000_000).unwrap();
    store
        .update_balance(TEST_SERVICE_ADDRESS, 1_000_000, &coinbase, false)
        .unwrap();
    TEST_SERVICE_ADDRESS.to_string()
}

/// Builds a ledger without rewards, initializes it and mines the genesis block
pub fn ready_ledger_with<S: LedgerStore + 'static>(store: Arc<S>) -> Result<(Ledger<S>, String)> {
    let ledger = Ledger::with_components(
        store,
        test_config(),
        Box::new(SeededAddressGenerator::new("testnet")),
        Box::new(NoRewards),
    );
    let service = ledger.init()?;
    ledger.mine_now()?;
    Ok((ledger, service))
}

pub fn ready_ledger() -> (Ledger<MemoryStore>, String) {
    ready_ledger_with(Arc::new(MemoryStore::new())).unwrap()
}

/// Same as `ready_ledger` over a Sled database in a temporary directory
pub fn create_test_sled_ledger() -> Result<(Ledger<SledStore>, String, TempDir)> {
    let temp_dir = create_temp_dir()?;
    let store = Arc::new(SledStore::open(&temp_dir.path().join("test_ledger"))?);
    let (ledger, service) = ready_ledger_with(store)?;
    Ok((ledger, service, temp_dir))
}

/// Sum of spendable and locked funds across every account
pub fn total_value<S: LedgerStore>(store: &S) -> Result<u64> {
    Ok(store.accounts()?.iter().map(|account| account.total()).sum())
}

/// A memory store whose relationship notifications fail a set number of times
/// before they start going through
pub struct FlakyStore {
    inner: MemoryStore,
    relationship_failures: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, relationship_failures: usize) -> FlakyStore {
        FlakyStore {
            inner,
            relationship_failures: AtomicUsize::new(relationship_failures),
        }
    }
}

impl LedgerStore for FlakyStore {
    fn create_account(&self, address: &str) -> Result<Account> {
        self.inner.create_account(address)
    }

    fn get_account(&self, address: &str) -> Result<Option<Account>> {
        self.inner.get_account(address)
    }

    fn account_count(&self) -> Result<u64> {
        self.inner.account_count()
    }

    fn accounts(&self) -> Result<Vec<Account>> {
        self.inner.accounts()
    }

    fn update_balance(
        &self,
        address: &str,
        new_balance: u64,
        tx: &Transaction,
        locked: bool,
    ) -> Result<()> {
        self.inner.update_balance(address, new_balance, tx, locked)
    }

    fn block_height(&self) -> Result<u64> {
        self.inner.block_height()
    }

    fn get_block(&self, height: u64) -> Result<Option<Block>> {
        self.inner.get_block(height)
    }

    fn get_transaction(&self, txid: &str) -> Result<Option<Transaction>> {
        self.inner.get_transaction(txid)
    }

    fn add_pending(&self, tx: Transaction) -> Result<()> {
        self.inner.add_pending(tx)
    }

    fn list_pending(&self) -> Result<Vec<Transaction>> {
        self.inner.list_pending()
    }

    fn commit_block(&self, block: &Block) -> Result<()> {
        self.inner.commit_block(block)
    }

    fn on_account_type_changed(&self, address: &str, new_type: Option<AccountType>) -> Result<()> {
        self.inner.on_account_type_changed(address, new_type)
    }

    fn on_relationship_changed(&self, from: &str, to: &str, added: bool) -> Result<()> {
        let failing = self
            .relationship_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(LedgerError::StorageFailure("disk hiccup".to_string()));
        }
        self.inner.on_relationship_changed(from, to, added)
    }

    fn relationships(&self) -> Result<Vec<(String, String)>> {
        self.inner.relationships()
    }

    fn get_service_address(&self) -> Result<Option<String>> {
        self.inner.get_service_address()
    }

    fn set_service_address(&self, address: &str) -> Result<()> {
        self.inner.set_service_address(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funded_store() {
        let (store, service) = funded_store();
        assert_eq!(store.block_height().unwrap(), 0);
        assert_eq!(total_value(store.as_ref()).unwrap(), 1_000_000);
        assert_eq!(store.get_service_address().unwrap(), Some(service));
    }

    #[test]
    fn test_ready_ledger_has_genesis() {
        let (ledger, service) = ready_ledger();
        assert_eq!(ledger.block_height().unwrap(), 1);
        assert_eq!(ledger.get_account(&service).unwrap().get_balance(), 1_000_000);
    }

    #[test]
    fn test_create_test_sled_ledger() {
        let (ledger, service, _temp_dir) = create_test_sled_ledger().unwrap();
        assert_eq!(ledger.block_height().unwrap(), 1);
        assert_eq!(ledger.service_address().unwrap(), service);
    }
}
