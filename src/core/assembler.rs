// Block production
// A block is [coinbase] + rewards + every pending transaction, executed strictly in order
// against the store and committed at the next height

use crate::config::LedgerConfig;
use crate::core::monetary::coinbase_reward;
use crate::core::{Block, ExecutionOutcome, RewardDistributor, Transaction, TransactionExecutor};
use crate::error::{LedgerError, Result};
use crate::storage::LedgerStore;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

pub struct BlockAssembler<S: LedgerStore> {
    store: Arc<S>,
    executor: TransactionExecutor<S>,
    distributor: Box<dyn RewardDistributor>,
    config: LedgerConfig,
    // Single-flight guard shared by the timer and on-demand paths
    in_flight: Mutex<()>,
}

impl<S: LedgerStore> BlockAssembler<S> {
    pub fn new(
        store: Arc<S>,
        distributor: Box<dyn RewardDistributor>,
        config: LedgerConfig,
    ) -> BlockAssembler<S> {
        let executor = TransactionExecutor::new(
            store.clone(),
            config.support_cost,
            config.claim_generator_amount,
        );
        BlockAssembler {
            store,
            executor,
            distributor,
            config,
            in_flight: Mutex::new(()),
        }
    }

    pub fn get_store(&self) -> &Arc<S> {
        &self.store
    }

    /// Assembles and commits one block, waiting for any assembly already in flight
    pub fn assemble(&self) -> Result<Block> {
        let _guard = self.in_flight.lock().map_err(|_| {
            error!("Failed to acquire block assembly lock");
            LedgerError::StorageFailure("assembly lock poisoned".to_string())
        })?;
        self.assemble_locked()
    }

    /// Like `assemble`, but returns `Ok(None)` instead of waiting when another
    /// assembly is in flight
    pub fn try_assemble(&self) -> Result<Option<Block>> {
        let _guard: MutexGuard<'_, ()> = match self.in_flight.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                debug!("Block assembly already in flight, dropping trigger");
                return Ok(None);
            }
            Err(TryLockError::Poisoned(_)) => {
                error!("Failed to acquire block assembly lock");
                return Err(LedgerError::StorageFailure(
                    "assembly lock poisoned".to_string(),
                ));
            }
        };
        self.assemble_locked().map(Some)
    }

    fn assemble_locked(&self) -> Result<Block> {
        let service_address = self
            .store
            .get_service_address()?
            .ok_or(LedgerError::ServiceAddressUnset)?;
        let height = self.store.block_height()?;

        let reward = coinbase_reward(height, self.config.block_reward, self.config.genesis_reward);
        let mut transactions = vec![Transaction::new_coinbase(&service_address, reward)?];

        let outcome = self.distributor.compute_rewards(self.config.distribute_reward)?;
        for assignment in &outcome.rewards {
            transactions.push(Transaction::new_reward(
                outcome.originator.as_deref(),
                &assignment.address,
                assignment.reward,
            )?);
        }

        // Snapshot; anything queued from here on waits for the next block
        transactions.extend(self.store.list_pending()?);
        let block = Block::new_block(height, transactions)?;

        let mut skipped = 0;
        for tx in block.get_transactions() {
            // A store failure skips this transaction only; the block still commits
            let outcome = self.executor.apply(tx).unwrap_or_else(|e| {
                error!(
                    "Storage failure on {} transaction {} in block {height}: {e}",
                    tx.get_kind(),
                    tx.get_id()
                );
                ExecutionOutcome::Skipped(e)
            });
            if let ExecutionOutcome::Skipped(reason) = outcome {
                warn!(
                    "Skipped {} transaction {} in block {height}: {reason}",
                    tx.get_kind(),
                    tx.get_id()
                );
                skipped += 1;
            }
        }

        self.store.commit_block(&block)?;
        if block.is_genesis() {
            info!("Committed genesis block paying {reward} to {service_address}");
        }
        info!(
            "Committed block {height} with {} transactions ({skipped} skipped)",
            block.get_transactions().len()
        );
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NoRewards, TxKind};
    use crate::storage::MemoryStore;
    use crate::testnet::test_utils::{
        fund_service, funded_store, test_config, total_value, FlakyStore,
    };

    #[test]
    fn test_assembly_requires_service_address() {
        let store = Arc::new(MemoryStore::new());
        let assembler = BlockAssembler::new(store.clone(), Box::new(NoRewards), test_config());
        assert_eq!(
            assembler.assemble().unwrap_err(),
            LedgerError::ServiceAddressUnset
        );
        assert_eq!(store.block_height().unwrap(), 0);
    }

    #[test]
    fn test_genesis_then_standard_reward() {
        let store = Arc::new(MemoryStore::new());
        store.create_account("SIMs").unwrap();
        store.set_service_address("SIMs").unwrap();
        let assembler = BlockAssembler::new(store.clone(), Box::new(NoRewards), test_config());

        let genesis = assembler.assemble().unwrap();
        assert_eq!(genesis.get_height(), 0);
        assert_eq!(genesis.get_transactions().len(), 1);
        assert_eq!(genesis.get_transactions()[0].get_amount(), 1_000_000);

        let second = assembler.assemble().unwrap();
        assert_eq!(second.get_height(), 1);
        assert_eq!(second.get_transactions()[0].get_amount(), 1);

        let service = store.get_account("SIMs").unwrap().unwrap();
        assert_eq!(service.get_balance(), 1_000_001);
    }

    #[test]
    fn test_pending_follow_coinbase_and_are_cleared() {
        let (store, service) = funded_store();
        let send = Transaction::new_normal(&service, "SIMuser", 10).unwrap();
        store.add_pending(send.clone()).unwrap();

        let assembler = BlockAssembler::new(store.clone(), Box::new(NoRewards), test_config());
        let block = assembler.assemble().unwrap();

        let kinds: Vec<TxKind> = block.get_transactions().iter().map(|tx| tx.get_kind()).collect();
        assert_eq!(kinds, vec![TxKind::Coinbase, TxKind::Normal]);
        assert_eq!(block.get_transactions()[1].get_id(), send.get_id());
        assert!(store.list_pending().unwrap().is_empty());
        assert_eq!(
            store.get_account("SIMuser").unwrap().unwrap().get_balance(),
            10
        );
    }

    #[test]
    fn test_try_assemble_drops_when_busy() {
        let (store, _) = funded_store();
        let assembler = BlockAssembler::new(store, Box::new(NoRewards), test_config());

        let guard = assembler.in_flight.lock().unwrap();
        assert_eq!(assembler.try_assemble().unwrap(), None);
        drop(guard);
        assert!(assembler.try_assemble().unwrap().is_some());
    }

    #[test]
    fn test_storage_failure_skips_one_transaction_and_commits() {
        let store = Arc::new(FlakyStore::new(MemoryStore::new(), 1));
        let service = fund_service(store.as_ref());
        store.create_account("SIMtarget").unwrap();
        let send = Transaction::new_normal(&service, "SIMtarget", 10).unwrap();
        let support = Transaction::new_support(&service, "SIMtarget", 1).unwrap();
        store.add_pending(send).unwrap();
        store.add_pending(support.clone()).unwrap();

        let assembler = BlockAssembler::new(store.clone(), Box::new(NoRewards), test_config());
        let before = total_value(store.as_ref()).unwrap();
        let block = assembler.assemble().unwrap();

        // The failed support is still part of the committed block
        assert_eq!(block.get_transactions().len(), 3);
        assert_eq!(block.get_transactions()[2].get_id(), support.get_id());
        assert!(store.list_pending().unwrap().is_empty());
        assert_eq!(store.block_height().unwrap(), 1);
        assert_eq!(total_value(store.as_ref()).unwrap(), before + 1_000_000);

        // Nothing from the first block is applied twice
        let before = total_value(store.as_ref()).unwrap();
        let second = assembler.assemble().unwrap();
        assert_eq!(second.get_transactions().len(), 1);
        assert_eq!(total_value(store.as_ref()).unwrap(), before + 1);

        let target = store.get_account("SIMtarget").unwrap().unwrap();
        assert_eq!(target.get_balance(), 10);
        let service_account = store.get_account(&service).unwrap().unwrap();
        assert_eq!(service_account.get_locked_balance(), 1);
    }
}
