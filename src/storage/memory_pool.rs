use crate::core::{Transaction, TxKind};
use crate::error::{LedgerError, Result};
use std::collections::HashSet;
use std::sync::RwLock;

/// Pending transactions in arrival order
pub struct PendingPool {
    inner: RwLock<Vec<Transaction>>,
}

impl Default for PendingPool {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingPool {
    pub fn new() -> PendingPool {
        PendingPool {
            inner: RwLock::new(vec![]),
        }
    }

    pub fn add(&self, tx: Transaction) -> Result<()> {
        if tx.get_kind().is_block_only() {
            return Err(LedgerError::InvalidTransaction(format!(
                "{} transactions are never pending",
                tx.get_kind()
            )));
        }
        match self.inner.write() {
            Ok(mut pool) => {
                if pool.iter().any(|pending| pending.get_id() == tx.get_id()) {
                    return Err(LedgerError::DuplicatePending(tx.get_id().to_string()));
                }
                log::debug!("Queued {} transaction {}", tx.get_kind(), tx.get_id());
                pool.push(tx);
                Ok(())
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on pending pool");
                Err(LedgerError::StorageFailure(
                    "pending pool lock poisoned".to_string(),
                ))
            }
        }
    }

    pub fn get(&self, txid: &str) -> Option<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.iter().find(|tx| tx.get_id() == txid).cloned(),
            Err(_) => {
                log::error!("Failed to acquire read lock on pending pool");
                None
            }
        }
    }

    pub fn list(&self) -> Vec<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.clone(),
            Err(_) => {
                log::error!("Failed to acquire read lock on pending pool");
                Vec::new()
            }
        }
    }

    /// Drops the entries whose id is in `ids`, keeping anything that arrived
    /// after the block was assembled. Returns how many were removed.
    pub fn remove_committed(&self, ids: &HashSet<&str>) -> usize {
        match self.inner.write() {
            Ok(mut pool) => {
                let before = pool.len();
                pool.retain(|tx| !ids.contains(tx.get_id()));
                before - pool.len()
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on pending pool");
                0
            }
        }
    }
}

/// Finds the pending transaction that `candidate` would duplicate.
///
/// Support: one in flight per `(from, to)` pair, whichever direction (add or
/// remove) it is. ClaimGenerator: one in flight per address, in either
/// position. Other kinds never collide.
pub fn find_duplicate<'a>(
    pending: &'a [Transaction],
    candidate: &Transaction,
) -> Option<&'a Transaction> {
    match candidate.get_kind() {
        TxKind::Support => pending.iter().find(|tx| {
            tx.get_kind() == TxKind::Support
                && tx.get_address_from() == candidate.get_address_from()
                && tx.get_address_to() == candidate.get_address_to()
        }),
        TxKind::ClaimGenerator => {
            let address = candidate
                .get_address_to()
                .or_else(|| candidate.get_address_from())?;
            pending
                .iter()
                .find(|tx| tx.get_kind() == TxKind::ClaimGenerator && tx.involves(address))
        }
        _ => None,
    }
}
