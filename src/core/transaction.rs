// This file implements the transaction records of the ledger
// A transaction names its parties by address, carries an amount and a kind,
// and is never mutated after construction except for the height tag it gets at commit

use crate::error::Result;
use crate::utils::{base58_encode, checksum, deserialize, serialize, sha256_digest};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What a transaction does to account state
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub enum TxKind {
    /// Mints the block reward to the service address
    Coinbase,
    /// Plain transfer between two accounts
    Normal,
    /// Distribution payout chosen by the reward distributor
    Reward,
    /// Escrow (claim) or release (unclaim) of the generator price
    ClaimGenerator,
    /// Escrow (add) or release (remove) of the support price
    Support,
}

impl TxKind {
    /// Coinbase and Reward transactions only ever exist inside a block
    pub fn is_block_only(&self) -> bool {
        matches!(self, TxKind::Coinbase | TxKind::Reward)
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxKind::Coinbase => write!(f, "coinbase"),
            TxKind::Normal => write!(f, "normal"),
            TxKind::Reward => write!(f, "reward"),
            TxKind::ClaimGenerator => write!(f, "claim_generator"),
            TxKind::Support => write!(f, "support"),
        }
    }
}

// The hashed form of a transaction: canonical fields plus a random salt,
// so two otherwise identical sends still get distinct ids
#[derive(Serialize, bincode::Encode)]
struct IdPreimage {
    address_from: Option<String>,
    address_to: Option<String>,
    amount: u64,
    kind: TxKind,
    salt: [u8; 16],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Transaction {
    id: String,                   // base58check(sha256(preimage))
    address_from: Option<String>, // None for coinbase and generator claims
    address_to: Option<String>,   // None for generator unclaims
    amount: u64,
    kind: TxKind,
    block_height: Option<u64>, // Set once the owning block commits
}

impl Transaction {
    /// Builds a transaction and assigns it a globally unique id.
    ///
    /// No validation happens here; intent checks and the executor decide
    /// whether the transaction is acceptable.
    pub fn new(
        address_from: Option<&str>,
        address_to: Option<&str>,
        amount: u64,
        kind: TxKind,
    ) -> Result<Transaction> {
        let salt = *Uuid::new_v4().as_bytes();
        let preimage = IdPreimage {
            address_from: address_from.map(str::to_string),
            address_to: address_to.map(str::to_string),
            amount,
            kind,
            salt,
        };
        let digest = sha256_digest(serialize(&preimage)?.as_slice());
        let mut payload = digest.clone();
        payload.extend(checksum(digest.as_slice()));

        Ok(Transaction {
            id: base58_encode(payload.as_slice()),
            address_from: preimage.address_from,
            address_to: preimage.address_to,
            amount,
            kind,
            block_height: None,
        })
    }

    // When I mint the block reward for the service account
    pub fn new_coinbase(to: &str, reward: u64) -> Result<Transaction> {
        Self::new(None, Some(to), reward, TxKind::Coinbase)
    }

    pub fn new_normal(from: &str, to: &str, amount: u64) -> Result<Transaction> {
        Self::new(Some(from), Some(to), amount, TxKind::Normal)
    }

    // The originator is informational only; the executor never debits it
    pub fn new_reward(originator: Option<&str>, to: &str, amount: u64) -> Result<Transaction> {
        Self::new(originator, Some(to), amount, TxKind::Reward)
    }

    /// `amount == support cost` adds the edge, `0` removes it
    pub fn new_support(from: &str, to: &str, amount: u64) -> Result<Transaction> {
        Self::new(Some(from), Some(to), amount, TxKind::Support)
    }

    /// claim: `{from: None, to: address}`, unclaim: `{from: address, to: None}`
    pub fn new_claim_generator(address: &str, claim: bool, amount: u64) -> Result<Transaction> {
        if claim {
            Self::new(None, Some(address), amount, TxKind::ClaimGenerator)
        } else {
            Self::new(Some(address), None, amount, TxKind::ClaimGenerator)
        }
    }

    /// Copy of this transaction tagged with the height of the block that settled it
    pub fn at_height(&self, height: u64) -> Transaction {
        Transaction {
            block_height: Some(height),
            ..self.clone()
        }
    }

    pub fn get_id(&self) -> &str {
        self.id.as_str()
    }

    pub fn get_address_from(&self) -> Option<&str> {
        self.address_from.as_deref()
    }

    pub fn get_address_to(&self) -> Option<&str> {
        self.address_to.as_deref()
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn get_kind(&self) -> TxKind {
        self.kind
    }

    pub fn get_block_height(&self) -> Option<u64> {
        self.block_height
    }

    /// True when `address` appears on either side of the transaction
    pub fn involves(&self, address: &str) -> bool {
        self.get_address_from() == Some(address) || self.get_address_to() == Some(address)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        deserialize(bytes)
    }
}
