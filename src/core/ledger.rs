// This file is the entry point for everything a client can ask of the ledger
// Intents are checked against committed state and queued; blocks settle them later
// Nothing here touches a balance directly - that is the executor's job

use crate::config::LedgerConfig;
use crate::core::{
    Account, AccountType, Block, BlockAssembler, BlockInfo, LotteryRewardDistributor,
    MiningDaemon, RewardDistributor, Transaction,
};
use crate::error::{LedgerError, Result};
use crate::storage::{find_duplicate, LedgerStore};
use crate::wallet::{AddressAllocator, AddressGenerator, SeededAddressGenerator};
use log::info;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Service-wide counters, as printed by `info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub block_height: u64,
    pub last_block_time: Option<i64>,
    pub addresses: u64,
    pub supports: usize,
    pub supporters: usize,
    pub supported: usize,
    pub generators: usize,
}

pub struct Ledger<S: LedgerStore + 'static> {
    store: Arc<S>,
    config: LedgerConfig,
    allocator: AddressAllocator<S>,
    daemon: MiningDaemon<S>,
    // Makes check-then-enqueue atomic across concurrent intents
    intake: Mutex<()>,
}

impl<S: LedgerStore + 'static> Ledger<S> {
    /// A ledger with the seeded address generator and the lottery distributor
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Ledger<S> {
        let generator = SeededAddressGenerator::new(&config.address_seed);
        let distributor = LotteryRewardDistributor::new(store.clone());
        Self::with_components(store, config, Box::new(generator), Box::new(distributor))
    }

    pub fn with_components(
        store: Arc<S>,
        config: LedgerConfig,
        generator: Box<dyn AddressGenerator>,
        distributor: Box<dyn RewardDistributor>,
    ) -> Ledger<S> {
        let allocator = AddressAllocator::new(store.clone(), generator);
        let assembler = Arc::new(BlockAssembler::new(
            store.clone(),
            distributor,
            config.clone(),
        ));
        let daemon = MiningDaemon::new(assembler, config.block_time());
        Ledger {
            store,
            config,
            allocator,
            daemon,
            intake: Mutex::new(()),
        }
    }

    pub fn get_store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn get_config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn get_daemon(&self) -> &MiningDaemon<S> {
        &self.daemon
    }

    fn intake(&self) -> Result<MutexGuard<'_, ()>> {
        self.intake.lock().map_err(|_| {
            log::error!("Failed to acquire intake lock");
            LedgerError::StorageFailure("intake lock poisoned".to_string())
        })
    }

    /// Returns the service address, allocating and storing it on first startup
    pub fn init(&self) -> Result<String> {
        if let Some(address) = self.store.get_service_address()? {
            return Ok(address);
        }
        let address = self.allocator.allocate()?;
        self.store.set_service_address(&address)?;
        info!("Service address is {address}");
        Ok(address)
    }

    pub fn service_address(&self) -> Result<String> {
        self.store
            .get_service_address()?
            .ok_or(LedgerError::ServiceAddressUnset)
    }

    /// Allocates a new address and queues its start bounty from the service account
    pub fn create_address(&self) -> Result<String> {
        let address = self.allocator.allocate()?;
        let bounty = self.config.address_start_bounty;
        if bounty > 0 {
            if let Some(service) = self.store.get_service_address()? {
                let tx = Transaction::new_normal(&service, &address, bounty)?;
                let _guard = self.intake()?;
                self.store.add_pending(tx)?;
            }
        }
        Ok(address)
    }

    pub fn get_account(&self, address: &str) -> Result<Account> {
        self.store
            .get_account(address)?
            .ok_or_else(|| LedgerError::AccountNotFound(address.to_string()))
    }

    /// Queues a Normal transfer once the sender can cover it from committed funds
    pub fn send(&self, from: &str, to: &str, amount: u64) -> Result<Transaction> {
        let _guard = self.intake()?;
        let sender = self.get_account(from)?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if sender.get_balance() < amount {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available: sender.get_balance(),
            });
        }

        let tx = Transaction::new_normal(from, to, amount)?;
        self.store.add_pending(tx.clone())?;
        info!("Queued send of {amount} from {from} to {to}");
        Ok(tx)
    }

    /// Queues adding (`add`) or removing a support edge `from -> to`
    pub fn support(&self, from: &str, to: &str, add: bool) -> Result<Transaction> {
        let _guard = self.intake()?;
        let supporter = self.get_account(from)?;
        self.get_account(to)?;

        let cost = self.config.support_cost;
        let available = if add {
            supporter.get_balance()
        } else {
            supporter.get_locked_balance()
        };
        if available < cost {
            return Err(LedgerError::InsufficientBalance {
                required: cost,
                available,
            });
        }

        let tx = Transaction::new_support(from, to, if add { cost } else { 0 })?;
        self.enqueue_unique(tx)
    }

    /// Queues a generator claim (`claim`) or unclaim for `address`
    pub fn claim_generator(&self, address: &str, claim: bool) -> Result<Transaction> {
        let _guard = self.intake()?;
        let account = self.get_account(address)?;

        let amount = self.config.claim_generator_amount;
        let available = if claim {
            account.get_balance()
        } else {
            account.get_locked_balance()
        };
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available,
            });
        }

        let tx = Transaction::new_claim_generator(address, claim, amount)?;
        self.enqueue_unique(tx)
    }

    // Caller holds the intake lock
    fn enqueue_unique(&self, tx: Transaction) -> Result<Transaction> {
        let pending = self.store.list_pending()?;
        if let Some(existing) = find_duplicate(&pending, &tx) {
            return Err(LedgerError::DuplicatePending(existing.get_id().to_string()));
        }
        self.store.add_pending(tx.clone())?;
        info!("Queued {} transaction {}", tx.get_kind(), tx.get_id());
        Ok(tx)
    }

    /// Assigns a role tag. Generator is only reachable through a claim, and a
    /// Generator keeps its role until it unclaims.
    pub fn set_account_type(&self, address: &str, account_type: AccountType) -> Result<()> {
        let _guard = self.intake()?;
        let account = self.get_account(address)?;
        if account_type == AccountType::Generator {
            return Err(LedgerError::InvalidAccountType(
                "Generator is claimed with claim_generator".to_string(),
            ));
        }
        if account.get_account_type() == Some(AccountType::Generator) {
            return Err(LedgerError::InvalidAccountType(format!(
                "{address} is a Generator; unclaim first"
            )));
        }
        self.store
            .on_account_type_changed(address, Some(account_type))?;
        info!("Set type of {address} to {account_type}");
        Ok(())
    }

    /// Addresses that `address` supports
    pub fn supporting(&self, address: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .relationships()?
            .into_iter()
            .filter(|(from, _)| from == address)
            .map(|(_, to)| to)
            .collect())
    }

    /// Addresses that support `address`
    pub fn supported(&self, address: &str) -> Result<Vec<String>> {
        let mut supporters: Vec<String> = self
            .store
            .relationships()?
            .into_iter()
            .filter(|(_, to)| to == address)
            .map(|(from, _)| from)
            .collect();
        supporters.sort();
        Ok(supporters)
    }

    pub fn stats(&self) -> Result<LedgerStats> {
        let block_height = self.store.block_height()?;
        let last_block_time = match block_height.checked_sub(1) {
            Some(height) => self
                .store
                .get_block(height)?
                .map(|block| block.get_timestamp()),
            None => None,
        };

        let edges = self.store.relationships()?;
        let supporters: BTreeSet<&str> = edges.iter().map(|(from, _)| from.as_str()).collect();
        let supported: BTreeSet<&str> = edges.iter().map(|(_, to)| to.as_str()).collect();
        let generators = self
            .store
            .accounts()?
            .iter()
            .filter(|account| account.get_account_type() == Some(AccountType::Generator))
            .count();

        Ok(LedgerStats {
            block_height,
            last_block_time,
            addresses: self.store.account_count()?,
            supports: edges.len(),
            supporters: supporters.len(),
            supported: supported.len(),
            generators,
        })
    }

    pub fn pending(&self) -> Result<Vec<Transaction>> {
        self.store.list_pending()
    }

    pub fn block_height(&self) -> Result<u64> {
        self.store.block_height()
    }

    pub fn block_info(&self, height: u64) -> Result<Option<BlockInfo>> {
        self.store.get_block_info(height)
    }

    pub fn mine_now(&self) -> Result<Block> {
        self.daemon.mine_now()
    }

    pub fn trigger_if_pending(&self) -> Result<Option<Block>> {
        self.daemon.trigger_if_pending()
    }
}
