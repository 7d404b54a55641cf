// This file is the state machine of the ledger
// Every balance change goes through TransactionExecutor::apply, one transaction at a time
// A transaction is either applied in full or rejected before anything is written

use crate::core::{Account, AccountType, Transaction, TxKind};
use crate::error::{LedgerError, Result};
use crate::storage::LedgerStore;
use log::debug;
use std::sync::Arc;

/// Result of applying a single transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Applied,
    /// Not applied. Rule rejections leave state untouched; a storage failure
    /// recorded by the assembler may have landed some of its writes
    Skipped(LedgerError),
}

impl ExecutionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ExecutionOutcome::Applied)
    }
}

pub struct TransactionExecutor<S: LedgerStore> {
    store: Arc<S>,
    support_cost: u64,
    claim_generator_amount: u64,
}

fn required_address<'a>(address: Option<&'a str>, tx: &Transaction, side: &str) -> Result<&'a str> {
    address.ok_or_else(|| {
        LedgerError::InvalidTransaction(format!(
            "{} transaction {} has no {side} address",
            tx.get_kind(),
            tx.get_id()
        ))
    })
}

fn ensure_funds(required: u64, available: u64) -> Result<()> {
    if available < required {
        return Err(LedgerError::InsufficientBalance {
            required,
            available,
        });
    }
    Ok(())
}

fn credited(current: u64, amount: u64) -> Result<u64> {
    current
        .checked_add(amount)
        .ok_or(LedgerError::InvalidAmount(amount))
}

impl<S: LedgerStore> TransactionExecutor<S> {
    pub fn new(store: Arc<S>, support_cost: u64, claim_generator_amount: u64) -> TransactionExecutor<S> {
        TransactionExecutor {
            store,
            support_cost,
            claim_generator_amount,
        }
    }

    /// Applies `tx` to account state.
    ///
    /// Rule violations come back as `Ok(ExecutionOutcome::Skipped(..))` with
    /// state untouched. `Err` means the store itself failed; writes made before
    /// the failure are not undone.
    pub fn apply(&self, tx: &Transaction) -> Result<ExecutionOutcome> {
        let result = match tx.get_kind() {
            TxKind::Coinbase | TxKind::Reward => self.apply_credit(tx),
            TxKind::Normal => self.apply_normal(tx),
            TxKind::Support => self.apply_support(tx),
            TxKind::ClaimGenerator => self.apply_claim_generator(tx),
        };

        match result {
            Ok(()) => {
                debug!("Applied {} transaction {}", tx.get_kind(), tx.get_id());
                Ok(ExecutionOutcome::Applied)
            }
            Err(e) if e.is_rejection() => Ok(ExecutionOutcome::Skipped(e)),
            Err(e) => Err(e),
        }
    }

    fn load(&self, address: &str) -> Result<Account> {
        self.store
            .get_account(address)?
            .ok_or_else(|| LedgerError::AccountNotFound(address.to_string()))
    }

    // Recipients are created the first time they receive anything
    fn load_or_create(&self, address: &str) -> Result<Account> {
        match self.store.get_account(address)? {
            Some(account) => Ok(account),
            None => self.store.create_account(address),
        }
    }

    fn credit(&self, address: &str, amount: u64, tx: &Transaction) -> Result<()> {
        let account = self.load_or_create(address)?;
        let new_balance = credited(account.get_balance(), amount)?;
        self.store.update_balance(address, new_balance, tx, false)
    }

    // Coinbase and Reward mint new value; the source, if any, is never debited
    fn apply_credit(&self, tx: &Transaction) -> Result<()> {
        let to = required_address(tx.get_address_to(), tx, "destination")?;
        if tx.get_amount() == 0 {
            return Err(LedgerError::InvalidAmount(0));
        }
        self.credit(to, tx.get_amount(), tx)
    }

    fn apply_normal(&self, tx: &Transaction) -> Result<()> {
        let from = required_address(tx.get_address_from(), tx, "source")?;
        let to = required_address(tx.get_address_to(), tx, "destination")?;
        let amount = tx.get_amount();

        let source = self.load(from)?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(0));
        }
        ensure_funds(amount, source.get_balance())?;
        // Destination can only fail on overflow; check before the debit is written
        if from != to {
            if let Some(destination) = self.store.get_account(to)? {
                credited(destination.get_balance(), amount)?;
            }
        }

        self.store
            .update_balance(from, source.get_balance() - amount, tx, false)?;
        // Re-read so a self-send sees its own debit
        self.credit(to, amount, tx)
    }

    // amount == support cost adds the edge, any other amount removes it
    fn apply_support(&self, tx: &Transaction) -> Result<()> {
        let from = required_address(tx.get_address_from(), tx, "source")?;
        let to = required_address(tx.get_address_to(), tx, "destination")?;
        let supporter = self.load(from)?;
        self.load(to)?;

        let cost = self.support_cost;
        let added = tx.get_amount() == cost;
        let (balance, locked) = if added {
            ensure_funds(cost, supporter.get_balance())?;
            (
                supporter.get_balance() - cost,
                credited(supporter.get_locked_balance(), cost)?,
            )
        } else {
            ensure_funds(cost, supporter.get_locked_balance())?;
            (
                credited(supporter.get_balance(), cost)?,
                supporter.get_locked_balance() - cost,
            )
        };

        self.store.update_balance(from, balance, tx, false)?;
        self.store.update_balance(from, locked, tx, true)?;
        self.store.on_relationship_changed(from, to, added)
    }

    // Claim sets only `to`, unclaim sets only `from`
    fn apply_claim_generator(&self, tx: &Transaction) -> Result<()> {
        let amount = self.claim_generator_amount;
        if tx.get_amount() != amount {
            return Err(LedgerError::InvalidAmount(tx.get_amount()));
        }
        let (address, claim) = match (tx.get_address_from(), tx.get_address_to()) {
            (None, Some(to)) => (to, true),
            (Some(from), None) => (from, false),
            _ => {
                return Err(LedgerError::InvalidTransaction(format!(
                    "claim_generator transaction {} must set exactly one address",
                    tx.get_id()
                )))
            }
        };

        let account = self.load(address)?;
        let (balance, locked, new_type) = if claim {
            ensure_funds(amount, account.get_balance())?;
            (
                account.get_balance() - amount,
                credited(account.get_locked_balance(), amount)?,
                AccountType::Generator,
            )
        } else {
            ensure_funds(amount, account.get_locked_balance())?;
            (
                credited(account.get_balance(), amount)?,
                account.get_locked_balance() - amount,
                AccountType::Supporter,
            )
        };

        self.store.update_balance(address, balance, tx, false)?;
        self.store.update_balance(address, locked, tx, true)?;
        self.store.on_account_type_changed(address, Some(new_type))
    }
}
