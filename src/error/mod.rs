//! Error handling for the ledger
//!
//! This module provides the error taxonomy for every ledger operation, from
//! intent validation through block execution down to storage access.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error types for ledger operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount exceeds the funds available on the account
    InsufficientBalance { required: u64, available: u64 },
    /// Amount is zero where a positive value is required, or does not match a fixed price
    InvalidAmount(u64),
    /// A Support or ClaimGenerator request collides with one already queued
    DuplicatePending(String),
    /// Operation references an account that was never created
    AccountNotFound(String),
    /// Block assembly attempted before the service address exists
    ServiceAddressUnset,
    /// Persistence call failed
    StorageFailure(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
    /// Invalid address format
    InvalidAddress(String),
    /// Structurally malformed transaction (e.g. claim with both parties set)
    InvalidTransaction(String),
    /// Address generator failed to produce a new address
    AddressGeneration(String),
    /// Role cannot be assigned directly (Generator is claimed, not set)
    InvalidAccountType(String),
}

impl LedgerError {
    /// True for errors that reject a single transaction without touching state.
    ///
    /// Block execution skips such transactions and carries on; any other
    /// error aborts the enclosing operation.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::InsufficientBalance { .. }
                | LedgerError::InvalidAmount(_)
                | LedgerError::AccountNotFound(_)
                | LedgerError::InvalidTransaction(_)
                | LedgerError::DuplicatePending(_)
        )
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::InsufficientBalance {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient balance: required {required}, available {available}"
                )
            }
            LedgerError::InvalidAmount(amount) => write!(f, "Invalid amount: {amount}"),
            LedgerError::DuplicatePending(msg) => write!(f, "Duplicate pending transaction: {msg}"),
            LedgerError::AccountNotFound(addr) => write!(f, "Account not found: {addr}"),
            LedgerError::ServiceAddressUnset => write!(f, "Service address is not set"),
            LedgerError::StorageFailure(msg) => write!(f, "Storage failure: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
            LedgerError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            LedgerError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            LedgerError::AddressGeneration(msg) => write!(f, "Address generation error: {msg}"),
            LedgerError::InvalidAccountType(msg) => write!(f, "Invalid account type: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<sled::Error> for LedgerError {
    fn from(err: sled::Error) -> Self {
        LedgerError::StorageFailure(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for LedgerError {
    fn from(err: bincode::error::EncodeError) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for LedgerError {
    fn from(err: bincode::error::DecodeError) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}
