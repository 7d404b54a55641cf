// Account state: every address owns a spendable balance and a locked balance
// Locked funds back a reversible commitment (a support edge or a generator claim)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role tag consumed by the reward distributor to weight payouts
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub enum AccountType {
    Supporter,
    Author,
    Generator,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Supporter => write!(f, "Supporter"),
            AccountType::Author => write!(f, "Author"),
            AccountType::Generator => write!(f, "Generator"),
        }
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supporter" => Ok(AccountType::Supporter),
            "author" => Ok(AccountType::Author),
            "generator" => Ok(AccountType::Generator),
            _ => Err(format!(
                "Invalid account type: {s}. Valid options: supporter, author, generator"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Account {
    address: String,
    balance: u64,                      // Spendable funds
    locked_balance: u64,               // Escrowed funds, released only by the matching undo transaction
    account_type: Option<AccountType>, // None until a role is assigned
    transactions: Vec<String>,         // Ids of every transaction that touched this account
}

impl Account {
    /// A fresh zero-balance account
    pub fn new(address: &str) -> Account {
        Account {
            address: address.to_string(),
            balance: 0,
            locked_balance: 0,
            account_type: None,
            transactions: vec![],
        }
    }

    pub fn get_address(&self) -> &str {
        self.address.as_str()
    }

    pub fn get_balance(&self) -> u64 {
        self.balance
    }

    pub fn get_locked_balance(&self) -> u64 {
        self.locked_balance
    }

    /// Sum of spendable and locked funds
    pub fn total(&self) -> u64 {
        self.balance.saturating_add(self.locked_balance)
    }

    pub fn get_account_type(&self) -> Option<AccountType> {
        self.account_type
    }

    pub fn get_transactions(&self) -> &[String] {
        self.transactions.as_slice()
    }

    // The setters below are for store implementations only;
    // everything else mutates balances through the TransactionExecutor.

    pub fn set_balance(&mut self, balance: u64, locked: bool) {
        if locked {
            self.locked_balance = balance;
        } else {
            self.balance = balance;
        }
    }

    pub fn set_account_type(&mut self, account_type: Option<AccountType>) {
        self.account_type = account_type;
    }

    pub fn record_transaction(&mut self, txid: &str) {
        self.transactions.push(txid.to_string());
    }
}
