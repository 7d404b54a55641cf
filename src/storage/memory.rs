// In-memory LedgerStore: everything lives behind one RwLock, the pending pool
// behind its own. Nothing survives the process.

use crate::core::{Account, AccountType, Block, Transaction};
use crate::error::{LedgerError, Result};
use crate::storage::{LedgerStore, PendingPool};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct MemoryState {
    accounts: BTreeMap<String, Account>,
    blocks: Vec<Block>,
    transactions: HashMap<String, Transaction>,
    relationships: BTreeMap<(String, String), u32>, // edge -> number of active supports
    service_address: Option<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    pending: PendingPool,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|_| {
            log::error!("Failed to acquire read lock on memory store");
            LedgerError::StorageFailure("memory store lock poisoned".to_string())
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|_| {
            log::error!("Failed to acquire write lock on memory store");
            LedgerError::StorageFailure("memory store lock poisoned".to_string())
        })
    }
}

impl LedgerStore for MemoryStore {
    fn create_account(&self, address: &str) -> Result<Account> {
        let mut state = self.write()?;
        if state.accounts.contains_key(address) {
            return Err(LedgerError::InvalidAddress(format!(
                "{address} already exists"
            )));
        }
        let account = Account::new(address);
        state.accounts.insert(address.to_string(), account.clone());
        Ok(account)
    }

    fn get_account(&self, address: &str) -> Result<Option<Account>> {
        Ok(self.read()?.accounts.get(address).cloned())
    }

    fn account_count(&self) -> Result<u64> {
        Ok(self.read()?.accounts.len() as u64)
    }

    fn accounts(&self) -> Result<Vec<Account>> {
        Ok(self.read()?.accounts.values().cloned().collect())
    }

    fn update_balance(
        &self,
        address: &str,
        new_balance: u64,
        tx: &Transaction,
        locked: bool,
    ) -> Result<()> {
        let mut state = self.write()?;
        let account = state
            .accounts
            .get_mut(address)
            .ok_or_else(|| LedgerError::AccountNotFound(address.to_string()))?;
        account.set_balance(new_balance, locked);
        account.record_transaction(tx.get_id());
        state
            .transactions
            .insert(tx.get_id().to_string(), tx.clone());
        Ok(())
    }

    fn block_height(&self) -> Result<u64> {
        Ok(self.read()?.blocks.len() as u64)
    }

    fn get_block(&self, height: u64) -> Result<Option<Block>> {
        Ok(self.read()?.blocks.get(height as usize).cloned())
    }

    fn get_transaction(&self, txid: &str) -> Result<Option<Transaction>> {
        if let Some(tx) = self.read()?.transactions.get(txid) {
            return Ok(Some(tx.clone()));
        }
        Ok(self.pending.get(txid))
    }

    fn add_pending(&self, tx: Transaction) -> Result<()> {
        self.pending.add(tx)
    }

    fn list_pending(&self) -> Result<Vec<Transaction>> {
        Ok(self.pending.list())
    }

    fn commit_block(&self, block: &Block) -> Result<()> {
        {
            let mut state = self.write()?;
            let expected = state.blocks.len() as u64;
            if block.get_height() != expected {
                return Err(LedgerError::StorageFailure(format!(
                    "block height {} does not follow committed height {expected}",
                    block.get_height()
                )));
            }
            for tx in block.get_transactions() {
                state
                    .transactions
                    .insert(tx.get_id().to_string(), tx.at_height(block.get_height()));
            }
            state.blocks.push(block.clone());
        }

        let ids: HashSet<&str> = block.get_transactions().iter().map(|tx| tx.get_id()).collect();
        self.pending.remove_committed(&ids);
        Ok(())
    }

    fn on_account_type_changed(
        &self,
        address: &str,
        new_type: Option<AccountType>,
    ) -> Result<()> {
        let mut state = self.write()?;
        let account = state
            .accounts
            .get_mut(address)
            .ok_or_else(|| LedgerError::AccountNotFound(address.to_string()))?;
        account.set_account_type(new_type);
        Ok(())
    }

    fn on_relationship_changed(&self, from: &str, to: &str, added: bool) -> Result<()> {
        let mut state = self.write()?;
        let key = (from.to_string(), to.to_string());
        if added {
            *state.relationships.entry(key).or_insert(0) += 1;
        } else if let Some(count) = state.relationships.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                state.relationships.remove(&key);
            }
        }
        Ok(())
    }

    fn relationships(&self) -> Result<Vec<(String, String)>> {
        Ok(self.read()?.relationships.keys().cloned().collect())
    }

    fn get_service_address(&self) -> Result<Option<String>> {
        Ok(self.read()?.service_address.clone())
    }

    fn set_service_address(&self, address: &str) -> Result<()> {
        let mut state = self.write()?;
        match &state.service_address {
            Some(existing) if existing != address => Err(LedgerError::StorageFailure(format!(
                "service address already set to {existing}"
            ))),
            _ => {
                state.service_address = Some(address.to_string());
                Ok(())
            }
        }
    }
}
