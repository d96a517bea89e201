//! Storage data models
//!
//! Defines wallet-related data structures for persistence and in-memory use.

use chrono::{DateTime, Utc};
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::ledger::address;
use crate::storage::keys::{self, KeyError};

/// In-memory wallet key material
///
/// Owns the Ed25519 seed together with the derived public identity. The
/// seed only exists in memory (zeroed on drop) and must be encrypted before
/// it touches disk. Signing rebuilds the `SigningKey` per call so the
/// unlocked key lives no longer than the signature computation.
#[derive(Clone)]
pub struct WalletKeys {
    /// Ed25519 seed (zeroed on drop)
    seed: Zeroizing<[u8; 32]>,

    /// Ledger-format public key (0xED || verifying key)
    pub public_key: [u8; 33],

    /// Derived classic address (pure function of the seed)
    pub address: String,
}

impl WalletKeys {
    /// Build the full key material from a 32-byte seed
    pub fn from_seed(seed: Zeroizing<[u8; 32]>) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let verifying_key = signing_key.verifying_key().to_bytes();
        let public_key = address::ledger_public_key(&verifying_key);
        let address = address::encode_classic_address(&address::account_id(&public_key));

        Self {
            seed,
            public_key,
            address,
        }
    }

    /// Sign a payload, returning a detached 64-byte signature
    ///
    /// The signing key is constructed for the duration of this call only.
    pub fn sign(&self, payload: &[u8]) -> [u8; 64] {
        use ed25519_dalek::Signer;
        let signing_key = SigningKey::from_bytes(&self.seed);
        signing_key.sign(payload).to_bytes()
    }

    /// 20-byte account id for this wallet
    pub fn account_id(&self) -> [u8; 20] {
        address::account_id(&self.public_key)
    }

    pub(crate) fn seed_bytes(&self) -> &[u8; 32] {
        &self.seed
    }
}

impl std::fmt::Debug for WalletKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletKeys")
            .field("address", &self.address)
            .field("public_key", &hex::encode(self.public_key))
            .finish_non_exhaustive()
    }
}

/// Wallet metadata (non-sensitive information)
///
/// Stored unencrypted alongside the encrypted seed for fast listing and
/// address lookup without unlocking anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletMetadata {
    /// Account-system user this wallet belongs to
    pub user_id: String,

    /// Derived classic address
    pub address: String,

    /// When the wallet was created on this device
    pub created_at: DateTime<Utc>,
}

impl WalletMetadata {
    /// Create new metadata for a wallet
    pub fn new(user_id: String, address: String) -> Self {
        Self {
            user_id,
            address,
            created_at: Utc::now(),
        }
    }
}

/// On-disk wallet record
///
/// This is what gets persisted per user. The seed is encrypted under the
/// device secret; public fields stay in the clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedWalletRecord {
    /// Encrypted Ed25519 seed (hex-encoded AES-GCM blob)
    pub encrypted_seed: String,

    /// Ledger-format public key (hex, not encrypted - it's public)
    pub public_key: String,

    /// Wallet metadata
    pub metadata: WalletMetadata,
}

impl EncryptedWalletRecord {
    /// Encrypt wallet keys under the device secret
    pub fn from_keys(
        keys: &WalletKeys,
        metadata: WalletMetadata,
        device_secret: &str,
    ) -> Result<Self, KeyError> {
        Ok(Self {
            encrypted_seed: keys::encrypt_seed(keys.seed_bytes(), device_secret)?,
            public_key: hex::encode(keys.public_key),
            metadata,
        })
    }

    /// Decrypt back to in-memory key material
    pub fn to_keys(&self, device_secret: &str) -> Result<WalletKeys, KeyError> {
        let seed = keys::decrypt_seed(&self.encrypted_seed, device_secret)?;
        let restored = WalletKeys::from_seed(seed);

        // A record whose stored address disagrees with the decrypted seed is corrupt
        if restored.address != self.metadata.address {
            return Err(KeyError::InvalidKey(format!(
                "Stored address {} does not match decrypted key material",
                self.metadata.address
            )));
        }

        Ok(restored)
    }
}
