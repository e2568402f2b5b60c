use super::{StorageBackend, Tables};
use crate::error::{AttrError, Result};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory storage backend for testing and embedding.
/// Does NOT persist data.
#[derive(Default)]
pub struct MemBackend {
    tables: RwLock<Tables>,
    simulate_write_error: AtomicBool,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backend with pre-built tables.
    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
            simulate_write_error: AtomicBool::new(false),
        }
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }
}

impl StorageBackend for MemBackend {
    fn load(&self) -> Result<Tables> {
        Ok(self.tables.read().clone())
    }

    fn store(&self, tables: &Tables) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(AttrError::Store("Simulated write error".to_string()));
        }
        *self.tables.write() = tables.clone();
        Ok(())
    }
}

// --- Test Fixtures ---
