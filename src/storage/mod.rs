//! Storage layer for wallet data
//!
//! Manages key derivation, encryption, and local persistence.

pub mod keys;
pub mod models;
pub mod secret_store;

pub use keys::{derive_keypair, KeyError};
pub use models::{EncryptedWalletRecord, WalletKeys, WalletMetadata};
pub use secret_store::{FileSecretStore, MemorySecretStore, SecretStore, StoreError};
