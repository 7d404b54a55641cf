// Reward distribution seam. The assembler hands a budget to a distributor and turns
// whatever assignments come back into Reward transactions.

use crate::core::AccountType;
use crate::error::Result;
use crate::storage::LedgerStore;
use log::debug;
use rand::seq::SliceRandom;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardAssignment {
    pub address: String,
    pub reward: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardOutcome {
    pub rewards: Vec<RewardAssignment>,
    /// Account credited as the source of the rewards; None when nobody is eligible
    pub originator: Option<String>,
}

pub trait RewardDistributor: Send + Sync {
    fn compute_rewards(&self, budget: u64) -> Result<RewardOutcome>;
}

/// Never pays anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRewards;

impl RewardDistributor for NoRewards {
    fn compute_rewards(&self, _budget: u64) -> Result<RewardOutcome> {
        Ok(RewardOutcome::default())
    }
}

/// Picks one Generator at random and pays it the whole budget.
///
/// Nothing is paid while the graph is empty: no typed accounts, no support
/// edges, or no Generator among the typed accounts.
pub struct LotteryRewardDistributor<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> LotteryRewardDistributor<S> {
    pub fn new(store: Arc<S>) -> LotteryRewardDistributor<S> {
        LotteryRewardDistributor { store }
    }
}

impl<S: LedgerStore> RewardDistributor for LotteryRewardDistributor<S> {
    fn compute_rewards(&self, budget: u64) -> Result<RewardOutcome> {
        let accounts = self.store.accounts()?;
        let typed = accounts
            .iter()
            .filter(|account| account.get_account_type().is_some())
            .count();
        if typed == 0 || self.store.relationships()?.is_empty() {
            debug!("No reward graph yet, skipping distribution");
            return Ok(RewardOutcome::default());
        }

        let generators: Vec<&str> = accounts
            .iter()
            .filter(|account| account.get_account_type() == Some(AccountType::Generator))
            .map(|account| account.get_address())
            .collect();
        let originator = match generators.choose(&mut rand::thread_rng()) {
            Some(address) => address.to_string(),
            None => return Ok(RewardOutcome::default()),
        };

        let rewards = if budget > 0 {
            vec![RewardAssignment {
                address: originator.clone(),
                reward: budget,
            }]
        } else {
            vec![]
        };
        Ok(RewardOutcome {
            rewards,
            originator: Some(originator),
        })
    }
}
