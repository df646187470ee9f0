use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::file::FileLedgerStore;
use crate::memory::InMemoryLedgerStore;
use crate::traits::LedgerStore;

/// Which [`LedgerStore`] implementation to open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Document directory for the file backend. Ignored by `memory`.
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            root: PathBuf::from(".tally"),
        }
    }
}

impl StoreConfig {
    pub fn open(&self) -> Arc<dyn LedgerStore> {
        match self.backend {
            StoreBackend::File => Arc::new(FileLedgerStore::new(&self.root)),
            StoreBackend::Memory => Arc::new(InMemoryLedgerStore::new()),
        }
    }
}
