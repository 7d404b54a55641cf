//! Address management
//!
//! This module handles deterministic address derivation, address validation,
//! and the serialized allocation of new accounts.

pub mod address;
pub mod allocator;

pub use address::{
    validate_address, AddressGenerator, SeededAddressGenerator, ADDRESS_CHECK_SUM_LEN,
    ADDRESS_PREFIX,
};
pub use allocator::AddressAllocator;
