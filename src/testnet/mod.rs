//! Test fixtures for the ledger
//!
//! This module provides ready-made stores and ledgers so unit tests can start
//! from a known state: a funded service account, a mined genesis block, or a
//! throwaway Sled database.

pub mod test_utils;

pub use test_utils::*;
