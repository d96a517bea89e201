//! Wallet manager - wallet lifecycle orchestration
//!
//! Coordinates the passkey ceremony, key derivation, and the secret store
//! into a `connect / disconnect` lifecycle and exposes the active wallet
//! (address, signing capability). Holds no network connections; all ledger
//! I/O goes through the ledger client.

use crate::auth::{AuthError, PasskeyAuthenticator};
use crate::storage::keys::{derive_keypair, KeyError};
use crate::storage::models::WalletKeys;
use crate::storage::secret_store::{SecretStore, StoreError};

/// Errors that can occur in the wallet manager
///
/// Connect failures carry the underlying stage so the caller can tell a
/// cancelled ceremony (retry at the user's initiative) from a storage or
/// derivation fault.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Wallet setup failed during passkey ceremony: {0}")]
    Auth(#[from] AuthError),

    #[error("Wallet setup failed during key derivation: {0}")]
    Key(#[from] KeyError),

    #[error("Wallet setup failed during secret storage: {0}")]
    Store(#[from] StoreError),

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("A connect attempt is already in progress")]
    ConnectInProgress,
}

/// Wallet lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletState {
    /// No attempt made yet to load local state this session
    Uninitialized,

    /// A connect attempt is running (ceremony or store access)
    Connecting,

    /// Wallet loaded; address and signing available
    Connected,

    /// Explicitly disconnected or last connect attempt failed
    Disconnected,
}

/// Orchestrates authenticator, derivation, and store into a wallet session
///
/// One instance is meaningful per running application session. The key
/// material lives here while connected (zeroed on drop) and never crosses
/// the API surface; callers get the address and detached signatures only.
pub struct WalletManager {
    authenticator: Box<dyn PasskeyAuthenticator>,
    store: Box<dyn SecretStore>,
    state: WalletState,
    keys: Option<WalletKeys>,
    user_id: Option<String>,
}

impl WalletManager {
    /// Create a manager over the given ceremony and storage capabilities
    pub fn new(authenticator: Box<dyn PasskeyAuthenticator>, store: Box<dyn SecretStore>) -> Self {
        Self {
            authenticator,
            store,
            state: WalletState::Uninitialized,
            keys: None,
            user_id: None,
        }
    }

    /// Connect the wallet for `user_id`
    ///
    /// If the secret store already holds a wallet for this user, reconnects
    /// silently without invoking the passkey ceremony. Otherwise runs
    /// ceremony → derivation → save. On failure the state is `Disconnected`
    /// and the call is safe to retry; a cancelled ceremony is never retried
    /// here, only at the caller's initiative.
    pub async fn connect(&mut self, user_id: &str) -> Result<(), ManagerError> {
        if self.state == WalletState::Connecting {
            return Err(ManagerError::ConnectInProgress);
        }
        self.state = WalletState::Connecting;

        match self.run_connect(user_id).await {
            Ok(keys) => {
                log::info!("Wallet connected for user {} ({})", user_id, keys.address);
                self.keys = Some(keys);
                self.user_id = Some(user_id.to_string());
                self.state = WalletState::Connected;
                Ok(())
            }
            Err(e) => {
                self.state = WalletState::Disconnected;
                Err(e)
            }
        }
    }

    async fn run_connect(&mut self, user_id: &str) -> Result<WalletKeys, ManagerError> {
        // Silent reconnect when a wallet already exists on this device
        if let Some(keys) = self.store.load(user_id)? {
            log::debug!("Silent reconnect for user {} ({})", user_id, keys.address);
            return Ok(keys);
        }

        // First connect on this device: ceremony, then deterministic
        // derivation with the user id as the per-user salt.
        let signal = self.authenticator.authenticate(user_id).await?;
        let keys = derive_keypair(&signal, user_id)?;
        self.store.save(user_id, &keys)?;

        Ok(keys)
    }

    /// Disconnect the wallet
    ///
    /// Drops the in-memory key material (zeroed on drop). The stored record
    /// is kept; use `erase_wallet` for explicit removal.
    pub fn disconnect(&mut self) {
        if self.keys.take().is_some() {
            log::info!("Wallet disconnected");
        }
        self.state = WalletState::Disconnected;
    }

    /// Erase the stored wallet for the connected user and disconnect
    ///
    /// Explicit, caller-initiated removal; the wallet is never erased
    /// implicitly.
    pub fn erase_wallet(&mut self) -> Result<(), ManagerError> {
        let user_id = self.user_id.clone().ok_or(ManagerError::NotConnected)?;
        self.store.erase(&user_id)?;
        self.disconnect();
        self.user_id = None;
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> WalletState {
        self.state
    }

    /// Whether a wallet is currently connected
    pub fn is_connected(&self) -> bool {
        self.state == WalletState::Connected
    }

    /// User the current wallet belongs to
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Derived classic address; valid only while connected
    pub fn address(&self) -> Result<&str, ManagerError> {
        self.connected_keys().map(|k| k.address.as_str())
    }

    /// Ledger-format public key; valid only while connected
    pub fn public_key(&self) -> Result<&[u8; 33], ManagerError> {
        self.connected_keys().map(|k| &k.public_key)
    }

    /// 20-byte account id; valid only while connected
    pub fn account_id(&self) -> Result<[u8; 20], ManagerError> {
        self.connected_keys().map(|k| k.account_id())
    }

    /// Sign a payload with the wallet key
    ///
    /// Returns a detached 64-byte signature. The raw private key never
    /// leaves the manager; the unlocked signing key exists only for the
    /// duration of the signature computation.
    pub fn sign(&self, payload: &[u8]) -> Result<[u8; 64], ManagerError> {
        self.connected_keys().map(|k| k.sign(payload))
    }

    fn connected_keys(&self) -> Result<&WalletKeys, ManagerError> {
        if self.state != WalletState::Connected {
            return Err(ManagerError::NotConnected);
        }
        self.keys.as_ref().ok_or(ManagerError::NotConnected)
    }
}

impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager")
            .field("state", &self.state)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
