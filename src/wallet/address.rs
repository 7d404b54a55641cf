use crate::error::{LedgerError, Result};
use crate::utils::{base58_decode, base58_encode, checksum, hash160};

const VERSION: u8 = 0x00;
pub const ADDRESS_PREFIX: &str = "SIM";
pub const ADDRESS_CHECK_SUM_LEN: usize = 4;

/// Maps an allocation index to an address string.
///
/// Implementations must be pure: the same index always yields the same
/// address, and distinct indices never collide.
pub trait AddressGenerator: Send + Sync {
    fn derive_address(&self, index: u64) -> Result<String>;
}

/// Deterministic generator: `SIM` + base58(version + hash160(seed || index) + checksum)
#[derive(Debug, Clone)]
pub struct SeededAddressGenerator {
    seed: Vec<u8>,
}

impl SeededAddressGenerator {
    pub fn new(seed: &str) -> SeededAddressGenerator {
        SeededAddressGenerator {
            seed: seed.as_bytes().to_vec(),
        }
    }
}

impl AddressGenerator for SeededAddressGenerator {
    fn derive_address(&self, index: u64) -> Result<String> {
        if self.seed.is_empty() {
            return Err(LedgerError::AddressGeneration(
                "generator seed is empty".to_string(),
            ));
        }
        let mut material = self.seed.clone();
        material.extend(index.to_be_bytes());
        let account_hash = hash160(material.as_slice());

        let mut payload: Vec<u8> = vec![];
        payload.push(VERSION);
        payload.extend(account_hash.as_slice());
        let checksum = checksum(payload.as_slice());
        payload.extend(checksum.as_slice());
        // prefix + base58(version + account_hash + checksum)
        Ok(format!("{ADDRESS_PREFIX}{}", base58_encode(payload.as_slice())))
    }
}

pub fn validate_address(address: &str) -> bool {
    let encoded = match address.strip_prefix(ADDRESS_PREFIX) {
        Some(encoded) => encoded,
        None => return false,
    };
    let payload = match base58_decode(encoded) {
        Ok(payload) => payload,
        Err(_) => return false, // Invalid base58 encoding
    };

    // Check if payload is long enough
    if payload.len() < ADDRESS_CHECK_SUM_LEN + 1 {
        return false;
    }

    let (body, actual_checksum) = payload.split_at(payload.len() - ADDRESS_CHECK_SUM_LEN);
    checksum(body).as_slice() == actual_checksum
}
