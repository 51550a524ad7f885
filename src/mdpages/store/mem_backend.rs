use super::backend::StorageBackend;
use crate::error::{Result, StorageError};
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the session is single-threaded.
/// This allows the `StorageBackend` trait to use `&self` for all methods.
#[derive(Default)]
pub struct MemBackend {
    values: RefCell<HashMap<String, String>>,
    writes: RefCell<HashMap<String, usize>>,
    simulate_write_error: RefCell<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value without counting it as a write.
    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Number of successful writes to `key` since creation.
    pub fn write_count(&self, key: &str) -> usize {
        self.writes.borrow().get(key).copied().unwrap_or(0)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl StorageBackend for MemBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(StorageError::Write {
                key: key.to_string(),
                reason: "Simulated write error".to_string(),
            }
            .into());
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        *self.writes.borrow_mut().entry(key.to_string()).or_default() += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}
