// Address issuance. The next index starts at the account count and ends in
// create_account, which is not an atomic read-modify-write on any store,
// so every allocation runs inside one critical section.

use crate::error::{LedgerError, Result};
use crate::storage::LedgerStore;
use crate::wallet::AddressGenerator;
use log::info;
use std::sync::{Arc, Mutex};

pub struct AddressAllocator<S: LedgerStore> {
    store: Arc<S>,
    generator: Box<dyn AddressGenerator>,
    lock: Mutex<()>,
}

impl<S: LedgerStore> AddressAllocator<S> {
    pub fn new(store: Arc<S>, generator: Box<dyn AddressGenerator>) -> AddressAllocator<S> {
        AddressAllocator {
            store,
            generator,
            lock: Mutex::new(()),
        }
    }

    /// Derives the address for the next index and registers it with zero balance
    pub fn allocate(&self) -> Result<String> {
        let _guard = self.lock.lock().map_err(|_| {
            log::error!("Failed to acquire address allocation lock");
            LedgerError::AddressGeneration("allocation lock poisoned".to_string())
        })?;

        // Recipients are created lazily, so the derived address for the current
        // count may already be taken; walk forward to the first free index
        let mut index = self.store.account_count()?;
        let mut address = self.generator.derive_address(index)?;
        while self.store.get_account(&address)?.is_some() {
            index += 1;
            address = self.generator.derive_address(index)?;
        }
        self.store.create_account(&address)?;
        info!("Allocated address {address} (index {index})");
        Ok(address)
    }
}
