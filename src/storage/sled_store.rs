// This is the durable LedgerStore - everything is kept in a Sled embedded database
// Each concern gets its own tree, and multi-tree writes go through Sled transactions
// so a committed block and its pending cleanup land together

use crate::config::GLOBAL_CONFIG;
use crate::core::{Account, AccountType, Block, Transaction};
use crate::error::{LedgerError, Result};
use crate::storage::LedgerStore;
use crate::utils::{deserialize, serialize};
use log::info;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// I use these constants to organize my database storage
const ACCOUNTS_TREE: &str = "accounts"; // address -> Account
const BLOCKS_TREE: &str = "blocks"; // height (big endian) -> Block
const TRANSACTIONS_TREE: &str = "transactions"; // txid -> Transaction
const PENDING_TREE: &str = "pending"; // arrival sequence (big endian) -> Transaction
const RELATIONSHIPS_TREE: &str = "relationships"; // (from, to) -> active support count
const SERVICE_TREE: &str = "service";
const SERVICE_ADDRESS_KEY: &str = "service_address";
const LEDGER_DB_NAME: &str = "ledger";

#[derive(Clone)]
pub struct SledStore {
    db: Db,
    accounts: Tree,
    blocks: Tree,
    transactions: Tree,
    pending: Tree,
    relationships: Tree,
    service: Tree,
    db_path: PathBuf,
}

// Sled transaction closures abort with a LedgerError; this flattens the two layers
fn map_tx_error(err: TransactionError<LedgerError>) -> LedgerError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => LedgerError::StorageFailure(e.to_string()),
    }
}

fn open_tree(db: &Db, name: &str) -> Result<Tree> {
    db.open_tree(name)
        .map_err(|e| LedgerError::StorageFailure(format!("Failed to open {name} tree: {e}")))
}

impl SledStore {
    /// Opens (or creates) the ledger database at `path`
    pub fn open(path: &Path) -> Result<SledStore> {
        let db = sled::open(path)
            .map_err(|e| LedgerError::StorageFailure(format!("Failed to open database: {e}")))?;
        info!("Opened ledger database at {}", path.display());

        Ok(SledStore {
            accounts: open_tree(&db, ACCOUNTS_TREE)?,
            blocks: open_tree(&db, BLOCKS_TREE)?,
            transactions: open_tree(&db, TRANSACTIONS_TREE)?,
            pending: open_tree(&db, PENDING_TREE)?,
            relationships: open_tree(&db, RELATIONSHIPS_TREE)?,
            service: open_tree(&db, SERVICE_TREE)?,
            db,
            db_path: path.to_path_buf(),
        })
    }

    /// Opens the ledger database under the configured data directory
    pub fn open_default() -> Result<SledStore> {
        Self::open(&GLOBAL_CONFIG.get_data_dir().join(LEDGER_DB_NAME))
    }

    pub fn get_db_path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Blocks until every pending write has reached disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn pending_entries(&self) -> Result<Vec<(sled::IVec, Transaction)>> {
        let mut entries = vec![];
        for item in self.pending.iter() {
            let (key, value) = item?;
            entries.push((key, Transaction::deserialize(value.as_ref())?));
        }
        Ok(entries)
    }
}

impl LedgerStore for SledStore {
    fn create_account(&self, address: &str) -> Result<Account> {
        let account = Account::new(address);
        let bytes = serialize(&account)?;
        match self
            .accounts
            .compare_and_swap(address, None as Option<&[u8]>, Some(bytes))?
        {
            Ok(()) => {
                self.flush()?;
                Ok(account)
            }
            Err(_) => Err(LedgerError::InvalidAddress(format!(
                "{address} already exists"
            ))),
        }
    }

    fn get_account(&self, address: &str) -> Result<Option<Account>> {
        match self.accounts.get(address)? {
            Some(bytes) => Ok(Some(deserialize(bytes.as_ref())?)),
            None => Ok(None),
        }
    }

    fn account_count(&self) -> Result<u64> {
        Ok(self.accounts.len() as u64)
    }

    fn accounts(&self) -> Result<Vec<Account>> {
        let mut accounts = vec![];
        for item in self.accounts.iter() {
            let (_, value) = item?;
            accounts.push(deserialize(value.as_ref())?);
        }
        Ok(accounts)
    }

    fn update_balance(
        &self,
        address: &str,
        new_balance: u64,
        tx: &Transaction,
        locked: bool,
    ) -> Result<()> {
        let tx_bytes = tx.serialize()?;

        (&self.accounts, &self.transactions)
            .transaction(|(accounts, transactions)| {
                let bytes = accounts.get(address)?.ok_or_else(|| {
                    ConflictableTransactionError::Abort(LedgerError::AccountNotFound(
                        address.to_string(),
                    ))
                })?;
                let mut account: Account =
                    deserialize(bytes.as_ref()).map_err(ConflictableTransactionError::Abort)?;
                account.set_balance(new_balance, locked);
                account.record_transaction(tx.get_id());
                let account_bytes =
                    serialize(&account).map_err(ConflictableTransactionError::Abort)?;

                accounts.insert(address.as_bytes(), account_bytes)?;
                transactions.insert(tx.get_id().as_bytes(), tx_bytes.as_slice())?;
                Ok(())
            })
            .map_err(map_tx_error)
    }

    fn block_height(&self) -> Result<u64> {
        Ok(self.blocks.len() as u64)
    }

    fn get_block(&self, height: u64) -> Result<Option<Block>> {
        match self.blocks.get(height.to_be_bytes())? {
            Some(bytes) => Ok(Some(Block::deserialize(bytes.as_ref())?)),
            None => Ok(None),
        }
    }

    fn get_transaction(&self, txid: &str) -> Result<Option<Transaction>> {
        if let Some(bytes) = self.transactions.get(txid)? {
            return Ok(Some(Transaction::deserialize(bytes.as_ref())?));
        }
        Ok(self
            .pending_entries()?
            .into_iter()
            .map(|(_, tx)| tx)
            .find(|tx| tx.get_id() == txid))
    }

    fn add_pending(&self, tx: Transaction) -> Result<()> {
        if tx.get_kind().is_block_only() {
            return Err(LedgerError::InvalidTransaction(format!(
                "{} transactions are never pending",
                tx.get_kind()
            )));
        }
        // generate_id is monotonic, so key order is arrival order
        let sequence = self.db.generate_id()?;
        self.pending.insert(sequence.to_be_bytes(), tx.serialize()?)?;
        log::debug!("Queued {} transaction {}", tx.get_kind(), tx.get_id());
        self.flush()
    }

    fn list_pending(&self) -> Result<Vec<Transaction>> {
        Ok(self
            .pending_entries()?
            .into_iter()
            .map(|(_, tx)| tx)
            .collect())
    }

    fn commit_block(&self, block: &Block) -> Result<()> {
        let height = block.get_height();
        let expected = self.block_height()?;
        if height != expected {
            return Err(LedgerError::StorageFailure(format!(
                "block height {height} does not follow committed height {expected}"
            )));
        }

        let block_bytes = block.serialize()?;
        let mut settled = vec![];
        for tx in block.get_transactions() {
            settled.push((tx.get_id().to_string(), tx.at_height(height).serialize()?));
        }

        // Only the entries that made it into this block; later arrivals stay queued
        let ids: HashSet<&str> = block.get_transactions().iter().map(|tx| tx.get_id()).collect();
        let settled_keys: Vec<sled::IVec> = self
            .pending_entries()?
            .into_iter()
            .filter(|(_, tx)| ids.contains(tx.get_id()))
            .map(|(key, _)| key)
            .collect();

        (&self.blocks, &self.transactions, &self.pending)
            .transaction(|(blocks, transactions, pending)| {
                blocks.insert(height.to_be_bytes().to_vec(), block_bytes.as_slice())?;
                for (txid, bytes) in &settled {
                    transactions.insert(txid.as_bytes(), bytes.as_slice())?;
                }
                for key in &settled_keys {
                    pending.remove(key.clone())?;
                }
                Ok(())
            })
            .map_err(map_tx_error)?;

        self.flush()
    }

    fn on_account_type_changed(
        &self,
        address: &str,
        new_type: Option<AccountType>,
    ) -> Result<()> {
        self.accounts
            .transaction(|accounts| {
                let bytes = accounts.get(address)?.ok_or_else(|| {
                    ConflictableTransactionError::Abort(LedgerError::AccountNotFound(
                        address.to_string(),
                    ))
                })?;
                let mut account: Account =
                    deserialize(bytes.as_ref()).map_err(ConflictableTransactionError::Abort)?;
                account.set_account_type(new_type);
                let account_bytes =
                    serialize(&account).map_err(ConflictableTransactionError::Abort)?;
                accounts.insert(address.as_bytes(), account_bytes)?;
                Ok(())
            })
            .map_err(map_tx_error)
    }

    fn on_relationship_changed(&self, from: &str, to: &str, added: bool) -> Result<()> {
        let key = serialize(&(from.to_string(), to.to_string()))?;
        self.relationships
            .transaction(|relationships| {
                let count = match relationships.get(key.as_slice())? {
                    Some(bytes) => {
                        let mut raw = [0u8; 4];
                        raw.copy_from_slice(&bytes[..4]);
                        u32::from_be_bytes(raw)
                    }
                    None => 0,
                };
                let count = if added {
                    count + 1
                } else {
                    count.saturating_sub(1)
                };
                if count == 0 {
                    relationships.remove(key.as_slice())?;
                } else {
                    relationships.insert(key.as_slice(), count.to_be_bytes().to_vec())?;
                }
                Ok(())
            })
            .map_err(map_tx_error)
    }

    fn relationships(&self) -> Result<Vec<(String, String)>> {
        let mut edges = vec![];
        for item in self.relationships.iter() {
            let (key, _) = item?;
            edges.push(deserialize::<(String, String)>(key.as_ref())?);
        }
        edges.sort();
        Ok(edges)
    }

    fn get_service_address(&self) -> Result<Option<String>> {
        match self.service.get(SERVICE_ADDRESS_KEY)? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes.to_vec()).map_err(|e| {
                LedgerError::StorageFailure(format!("Invalid service address format: {e}"))
            })?)),
            None => Ok(None),
        }
    }

    fn set_service_address(&self, address: &str) -> Result<()> {
        let swapped = self.service.compare_and_swap(
            SERVICE_ADDRESS_KEY,
            None as Option<&[u8]>,
            Some(address.as_bytes()),
        )?;
        if swapped.is_err() {
            let existing = self.get_service_address()?;
            if existing.as_deref() != Some(address) {
                return Err(LedgerError::StorageFailure(format!(
                    "service address already set to {}",
                    existing.unwrap_or_default()
                )));
            }
        }
        self.flush()
    }
}
