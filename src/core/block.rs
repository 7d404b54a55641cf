use crate::core::Transaction;
use crate::error::{LedgerError, Result};
use crate::utils::{current_timestamp, deserialize, serialize};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Block {
    height: u64,    // Count of blocks committed before this one
    timestamp: i64, // Assembly time in ms since the unix epoch
    transactions: Vec<Transaction>,
}

/// Summary view of a committed block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub time: i64,
    #[serde(rename = "txIds")]
    pub tx_ids: Vec<String>,
}

impl Block {
    /// Blocks always open with their coinbase, so an empty list is rejected
    pub fn new_block(height: u64, transactions: Vec<Transaction>) -> Result<Block> {
        if transactions.is_empty() {
            return Err(LedgerError::InvalidTransaction(
                "Block must contain at least one transaction".to_string(),
            ));
        }

        Ok(Block {
            height,
            timestamp: current_timestamp()?,
            transactions,
        })
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        deserialize::<Block>(bytes)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_height(&self) -> u64 {
        self.height
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    pub fn tx_ids(&self) -> Vec<String> {
        self.transactions
            .iter()
            .map(|tx| tx.get_id().to_string())
            .collect()
    }

    pub fn info(&self) -> BlockInfo {
        BlockInfo {
            height: self.height,
            time: self.timestamp,
            tx_ids: self.tx_ids(),
        }
    }
}
