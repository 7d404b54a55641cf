//! Configuration management
//!
//! Node settings (data directory, config file location) live in the
//! process-wide `GLOBAL_CONFIG`; the ledger economics and block timing live in
//! `LedgerConfig`, loaded from TOML with environment overrides.

pub mod ledger;
pub mod settings;

pub use ledger::LedgerConfig;
pub use settings::{Config, GLOBAL_CONFIG};
