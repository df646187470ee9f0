//! JSON-document ledger store on the local filesystem.
//!
//! Layout: one file per identity, `<root>/<digest>.json`, where `digest` is
//! [`IdentityKey::storage_digest`]. Saves write a sibling temp file and
//! rename it over the document so readers never observe a torn write.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tally_ledger::Ledger;
use tally_types::IdentityKey;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::traits::LedgerStore;

const DOCUMENT_EXTENSION: &str = "json";

/// Filesystem-backed implementation of [`LedgerStore`].
#[derive(Clone, Debug)]
pub struct FileLedgerStore {
    root: PathBuf,
}

impl FileLedgerStore {
    /// Use `root` as the document directory. The directory is created on
    /// first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document owned by `identity`.
    pub fn document_path(&self, identity: &IdentityKey) -> PathBuf {
        self.root
            .join(identity.storage_digest())
            .with_extension(DOCUMENT_EXTENSION)
    }

    fn temp_path(&self, identity: &IdentityKey) -> PathBuf {
        self.root
            .join(format!(".{}", identity.storage_digest()))
            .with_extension("tmp")
    }
}

#[async_trait]
impl LedgerStore for FileLedgerStore {
    async fn load(&self, identity: &IdentityKey) -> StoreResult<Ledger> {
        let path = self.document_path(identity);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%identity, path = %path.display(), "no ledger document yet");
                return Ok(Ledger::new());
            }
            Err(e) => {
                return Err(StoreError::unavailable(format!(
                    "reading {}: {e}",
                    path.display()
                )))
            }
        };

        let ledger: Ledger =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                identity: identity.to_string(),
                reason: e.to_string(),
            })?;
        debug!(
            %identity,
            counterparties = ledger.counterparties().len(),
            transactions = ledger.transactions().len(),
            "loaded ledger document"
        );
        Ok(ledger)
    }

    async fn save(&self, identity: &IdentityKey, ledger: &Ledger) -> StoreResult<()> {
        let encoded = serde_json::to_vec_pretty(ledger)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        fs::create_dir_all(&self.root).await.map_err(|e| {
            StoreError::unavailable(format!("creating {}: {e}", self.root.display()))
        })?;

        let temp = self.temp_path(identity);
        let path = self.document_path(identity);
        if let Err(e) = fs::write(&temp, &encoded).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StoreError::unavailable(format!(
                "writing {}: {e}",
                temp.display()
            )));
        }
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StoreError::unavailable(format!(
                "replacing {}: {e}",
                path.display()
            )));
        }

        info!(%identity, bytes = encoded.len(), path = %path.display(), "saved ledger document");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
