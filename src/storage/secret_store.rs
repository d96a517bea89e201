//! Secret store implementations
//!
//! Persists the derived wallet keypair per user, scoped to the local
//! device. A missing wallet is a normal state, not a failure, so `load`
//! returns `Ok(None)` rather than an error. `load` never touches the
//! network.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::storage::keys::KeyError;
use crate::storage::models::{EncryptedWalletRecord, WalletKeys, WalletMetadata};

/// Secret store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("Wallets directory not found")]
    WalletsDirectoryNotFound,
}

/// Local persistence for derived wallet key material
///
/// Implementations own the at-rest confidentiality of the seed; callers
/// only ever see the decrypted `WalletKeys`. Concurrent `save` for the
/// same user is not expected; if it occurs, last write wins.
pub trait SecretStore: Send + Sync {
    /// Persist (or overwrite) the wallet for `user_id`
    fn save(&self, user_id: &str, keys: &WalletKeys) -> Result<(), StoreError>;

    /// Load the wallet for `user_id`; `None` when no wallet has been created yet
    fn load(&self, user_id: &str) -> Result<Option<WalletKeys>, StoreError>;

    /// Remove the wallet for `user_id`; removing a missing wallet is a no-op
    fn erase(&self, user_id: &str) -> Result<(), StoreError>;
}

/// File-backed secret store
///
/// Stores one record per user at `<wallets_dir>/<user_id>/wallet.json`,
/// with the seed encrypted under an injectable device secret (AES-GCM over
/// a PBKDF2-derived key).
pub struct FileSecretStore {
    wallets_dir: PathBuf,
    device_secret: String,
}

impl FileSecretStore {
    /// Create a store rooted at the given wallets directory
    ///
    /// # Arguments
    ///
    /// * `wallets_dir` - Base directory; created lazily on first save
    /// * `device_secret` - Device-scoped secret for at-rest encryption
    pub fn new(wallets_dir: PathBuf, device_secret: String) -> Self {
        Self {
            wallets_dir,
            device_secret,
        }
    }

    /// Create a store at the default location
    ///
    /// Returns a store rooted at `~/.mpt-wallet/wallets/`.
    pub fn default_location(device_secret: String) -> Result<Self, StoreError> {
        let config_dir = crate::config::default_config_dir()
            .map_err(|_| StoreError::WalletsDirectoryNotFound)?;
        Ok(Self::new(config_dir.join("wallets"), device_secret))
    }

    /// Create a store at the configured wallets directory
    ///
    /// Uses `config.wallets_dir` when set, falling back to the default
    /// location otherwise.
    pub fn from_config(
        config: &crate::config::GlobalConfig,
        device_secret: String,
    ) -> Result<Self, StoreError> {
        match &config.wallets_dir {
            Some(dir) => Ok(Self::new(PathBuf::from(dir), device_secret)),
            None => Self::default_location(device_secret),
        }
    }

    /// Directory holding the record for one user
    fn wallet_dir(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        validate_user_id(user_id)?;
        Ok(self.wallets_dir.join(user_id))
    }

    fn record_path(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        Ok(self.wallet_dir(user_id)?.join("wallet.json"))
    }

    /// Check whether a wallet record exists for `user_id`
    pub fn wallet_exists(&self, user_id: &str) -> bool {
        self.record_path(user_id)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// List metadata for all wallets on this device
    ///
    /// Reads only the unencrypted metadata; no seed is decrypted. Records
    /// that fail to parse are skipped with a warning.
    pub fn list_wallets(&self) -> Result<Vec<WalletMetadata>, StoreError> {
        if !self.wallets_dir.exists() {
            return Ok(Vec::new());
        }

        let mut wallets = Vec::new();
        for entry in fs::read_dir(&self.wallets_dir)? {
            let entry = entry?;
            let record_path = entry.path().join("wallet.json");
            if !record_path.is_file() {
                continue;
            }
            match fs::read_to_string(&record_path)
                .map_err(StoreError::from)
                .and_then(|json| {
                    serde_json::from_str::<EncryptedWalletRecord>(&json).map_err(StoreError::from)
                }) {
                Ok(record) => wallets.push(record.metadata),
                Err(e) => {
                    log::warn!("Skipping unreadable wallet record {:?}: {}", record_path, e);
                }
            }
        }

        // Newest first
        wallets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(wallets)
    }
}

impl SecretStore for FileSecretStore {
    fn save(&self, user_id: &str, keys: &WalletKeys) -> Result<(), StoreError> {
        let dir = self.wallet_dir(user_id)?;
        fs::create_dir_all(&dir)?;

        let metadata = WalletMetadata::new(user_id.to_string(), keys.address.clone());
        let record = EncryptedWalletRecord::from_keys(keys, metadata, &self.device_secret)?;
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(dir.join("wallet.json"), json)?;

        log::debug!("Saved wallet record for user {} ({})", user_id, keys.address);
        Ok(())
    }

    fn load(&self, user_id: &str) -> Result<Option<WalletKeys>, StoreError> {
        let path = self.record_path(user_id)?;
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(path)?;
        let record: EncryptedWalletRecord = serde_json::from_str(&json)?;
        let keys = record.to_keys(&self.device_secret)?;
        Ok(Some(keys))
    }

    fn erase(&self, user_id: &str) -> Result<(), StoreError> {
        let dir = self.wallet_dir(user_id)?;
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
            log::info!("Erased wallet record for user {}", user_id);
        }
        Ok(())
    }
}

/// In-memory secret store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemorySecretStore {
    records: Mutex<HashMap<String, WalletKeys>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn save(&self, user_id: &str, keys: &WalletKeys) -> Result<(), StoreError> {
        validate_user_id(user_id)?;
        self.records
            .lock()
            .expect("secret store poisoned")
            .insert(user_id.to_string(), keys.clone());
        Ok(())
    }

    fn load(&self, user_id: &str) -> Result<Option<WalletKeys>, StoreError> {
        validate_user_id(user_id)?;
        Ok(self
            .records
            .lock()
            .expect("secret store poisoned")
            .get(user_id)
            .cloned())
    }

    fn erase(&self, user_id: &str) -> Result<(), StoreError> {
        validate_user_id(user_id)?;
        self.records
            .lock()
            .expect("secret store poisoned")
            .remove(user_id);
        Ok(())
    }
}

/// Reject user ids that cannot form a safe path component
fn validate_user_id(user_id: &str) -> Result<(), StoreError> {
    if user_id.is_empty()
        || user_id.contains(['/', '\\'])
        || user_id == "."
        || user_id == ".."
    {
        return Err(StoreError::InvalidUserId(user_id.to_string()));
    }
    Ok(())
}
