use crate::core::monetary::{
    ADDRESS_START_BOUNTY, BLOCK_REWARD, BLOCK_TIME_SECS, CLAIM_GENERATOR_AMOUNT,
    DISTRIBUTE_REWARD, GENESIS_BLOCK_REWARD, SUPPORT_COST,
};
use crate::error::{LedgerError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_ADDRESS_SEED: &str = "support-ledger";

/// Economics and timing of the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Period of the mining daemon
    pub block_time_secs: u64,
    /// Coinbase amount for every block after genesis
    pub block_reward: u64,
    /// Coinbase amount for block 0
    pub genesis_reward: u64,
    /// Budget handed to the reward distributor per block
    pub distribute_reward: u64,
    /// Escrow for a generator claim
    pub claim_generator_amount: u64,
    /// Bounty queued for every address registered after the service address
    pub address_start_bounty: u64,
    /// Escrow for one support edge
    pub support_cost: u64,
    /// Seed of the deterministic address generator
    pub address_seed: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            block_time_secs: BLOCK_TIME_SECS,
            block_reward: BLOCK_REWARD,
            genesis_reward: GENESIS_BLOCK_REWARD,
            distribute_reward: DISTRIBUTE_REWARD,
            claim_generator_amount: CLAIM_GENERATOR_AMOUNT,
            address_start_bounty: ADDRESS_START_BOUNTY,
            support_cost: SUPPORT_COST,
            address_seed: DEFAULT_ADDRESS_SEED.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Defaults, then the TOML file (if any), then `LEDGER_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<LedgerConfig> {
        let mut config = match path {
            Some(path) => {
                info!("Loading ledger configuration from {}", path.display());
                Self::from_toml_str(&fs::read_to_string(path)?)?
            }
            None => LedgerConfig::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<LedgerConfig> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies overrides looked up by variable name (e.g. `LEDGER_BLOCK_REWARD`)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let numeric: [(&str, &mut u64); 7] = [
            ("LEDGER_BLOCK_TIME_SECS", &mut self.block_time_secs),
            ("LEDGER_BLOCK_REWARD", &mut self.block_reward),
            ("LEDGER_GENESIS_REWARD", &mut self.genesis_reward),
            ("LEDGER_DISTRIBUTE_REWARD", &mut self.distribute_reward),
            (
                "LEDGER_CLAIM_GENERATOR_AMOUNT",
                &mut self.claim_generator_amount,
            ),
            ("LEDGER_ADDRESS_START_BOUNTY", &mut self.address_start_bounty),
            ("LEDGER_SUPPORT_COST", &mut self.support_cost),
        ];

        for (key, field) in numeric {
            if let Some(raw) = lookup(key) {
                *field = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| LedgerError::Config(format!("{key}={raw}: {e}")))?;
            }
        }

        if let Some(seed) = lookup("LEDGER_ADDRESS_SEED") {
            self.address_seed = seed;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_time_secs == 0 {
            return Err(LedgerError::Config(
                "block_time_secs must be positive".to_string(),
            ));
        }
        if self.claim_generator_amount == 0 {
            return Err(LedgerError::Config(
                "claim_generator_amount must be positive".to_string(),
            ));
        }
        // A zero cost would make "add" and "remove" support indistinguishable
        if self.support_cost == 0 {
            return Err(LedgerError::Config(
                "support_cost must be positive".to_string(),
            ));
        }
        if self.address_seed.is_empty() {
            return Err(LedgerError::Config(
                "address_seed must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn block_time(&self) -> Duration {
        Duration::from_secs(self.block_time_secs)
    }
}
