use std::path::Path;

use serde::{Deserialize, Serialize};
use tally_store::StoreConfig;
use tally_types::{Identity, IdentityKey};

use crate::error::{SessionError, SessionResult};

/// Who owns the ledger this process works on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub key: String,
    pub display_name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            key: "local".into(),
            display_name: "Me".into(),
        }
    }
}

/// Top-level configuration, usually read from a TOML file.
///
/// ```toml
/// currency_symbol = "€"
///
/// [identity]
/// key = "google:1234"
/// display_name = "Dana"
///
/// [store]
/// backend = "file"
/// root = "/home/dana/.local/share/tally"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    pub currency_symbol: String,
    pub identity: IdentityConfig,
    pub store: StoreConfig,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "$".into(),
            identity: IdentityConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl TallyConfig {
    pub fn from_toml_str(raw: &str) -> SessionResult<Self> {
        toml::from_str(raw).map_err(|e| SessionError::Config(e.to_string()))
    }

    pub async fn load(path: &Path) -> SessionResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SessionError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn identity(&self) -> SessionResult<Identity> {
        let key = IdentityKey::new(self.identity.key.as_str())?;
        Ok(Identity::new(key, self.identity.display_name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tally_store::StoreBackend;

    #[test]
    fn default_config() {
        let c = TallyConfig::default();
        assert_eq!(c.identity.key, "local");
        assert_eq!(c.identity.display_name, "Me");
        assert_eq!(c.store.backend, StoreBackend::File);
        assert_eq!(c.currency_symbol, "$");
        assert_eq!(c.identity().unwrap().key.as_str(), "local");
    }

    #[test]
    fn parses_full_document() {
        let c = TallyConfig::from_toml_str(
            r#"
            currency_symbol = "€"

            [identity]
            key = "google:1234"
            display_name = "Dana"

            [store]
            backend = "memory"
            root = "/tmp/tally"
            "#,
        )
        .unwrap();
        assert_eq!(c.currency_symbol, "€");
        assert_eq!(c.identity.display_name, "Dana");
        assert_eq!(c.store.backend, StoreBackend::Memory);
        assert_eq!(c.store.root, PathBuf::from("/tmp/tally"));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let c = TallyConfig::from_toml_str("[identity]\nkey = \"uid-9\"\n").unwrap();
        assert_eq!(c.identity.key, "uid-9");
        assert_eq!(c.identity.display_name, "Me");
        assert_eq!(c.store, StoreConfig::default());
    }

    #[test]
    fn bad_documents_are_config_errors() {
        let err = TallyConfig::from_toml_str("currency_symbol = [").unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));

        let c = TallyConfig::from_toml_str("[identity]\nkey = \"  \"\n").unwrap();
        assert!(matches!(c.identity().unwrap_err(), SessionError::Identity(_)));
    }

    #[tokio::test]
    async fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        std::fs::write(&path, "currency_symbol = \"£\"\n").unwrap();
        assert_eq!(TallyConfig::load(&path).await.unwrap().currency_symbol, "£");

        let err = TallyConfig::load(&dir.path().join("missing.toml")).await.unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }
}
