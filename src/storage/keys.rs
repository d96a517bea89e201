//! Key derivation and encryption utilities
//!
//! Derives the ledger Ed25519 keypair from a passkey assertion signal and a
//! per-user salt, and provides AES-GCM encryption for at-rest key storage.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::auth::AssertionSignal;
use crate::storage::models::WalletKeys;

/// Domain separation string for seed derivation
const SEED_DERIVATION_INFO: &[u8] = b"mpt-wallet/ed25519-seed/v1";

/// Key derivation and encryption errors
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Key derivation error: {0}")]
    Derivation(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),
}

/// Derive the ledger keypair from a passkey assertion signal
///
/// Pure and deterministic: the same `(signal, salt)` pair always yields the
/// same keypair and address, which is what lets a user recover their wallet
/// after local storage is wiped, as long as the passkey credential persists.
///
/// The assertion output is never used directly as a key; it is stretched
/// through HKDF-SHA256 with the per-user salt and a fixed domain string
/// before becoming the Ed25519 seed.
///
/// # Arguments
///
/// * `signal` - Assertion signal from the passkey ceremony
/// * `salt` - Per-user salt (stable across reinstalls)
///
/// # Errors
///
/// `KeyError::Derivation` on empty assertion output or empty salt.
pub fn derive_keypair(signal: &AssertionSignal, salt: &str) -> Result<WalletKeys, KeyError> {
    if signal.output.is_empty() {
        return Err(KeyError::Derivation(
            "assertion signal carries no output".to_string(),
        ));
    }
    if salt.is_empty() {
        return Err(KeyError::Derivation("salt must not be empty".to_string()));
    }

    let hk = Hkdf::<Sha256>::new(Some(salt.as_bytes()), &signal.output);
    let mut seed = Zeroizing::new([0u8; 32]);
    hk.expand(SEED_DERIVATION_INFO, seed.as_mut())
        .map_err(|e| KeyError::Derivation(format!("HKDF expand failed: {}", e)))?;

    Ok(WalletKeys::from_seed(seed))
}

/// Encrypt data using AES-256-GCM with a password-derived key
///
/// - PBKDF2-HMAC-SHA256 with 600,000 iterations
/// - Random 128-bit salt
/// - Random 96-bit nonce for each encryption
/// - Returns: salt (16 bytes) || nonce (12 bytes) || ciphertext || tag (16 bytes)
///
/// # Arguments
///
/// * `data` - Plaintext bytes to encrypt
/// * `secret` - Device-scoped secret used as the password
///
/// # Returns
///
/// Encrypted data as hex string (salt + nonce + ciphertext + tag)
pub fn encrypt_data(data: &[u8], secret: &str) -> Result<String, KeyError> {
    // Random salt (128 bits / 16 bytes)
    let mut salt = [0u8; 16];
    OsRng.fill_bytes(&mut salt);

    // Derive 256-bit key via PBKDF2-HMAC-SHA256, 600k iterations
    let mut key_bytes = Zeroizing::new([0u8; 32]);
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), &salt, 600_000, key_bytes.as_mut());
    let key = aes_gcm::Key::<Aes256Gcm>::from_slice(key_bytes.as_ref());

    let cipher = Aes256Gcm::new(key);

    // Random nonce (96 bits / 12 bytes)
    let mut nonce_bytes = [0u8; 12];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, data)
        .map_err(|e| KeyError::Encryption(e.to_string()))?;

    // Combine: salt || nonce || ciphertext
    let mut result = salt.to_vec();
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    Ok(hex::encode(result))
}

/// Decrypt data encrypted with `encrypt_data`
///
/// # Arguments
///
/// * `encrypted_hex` - Hex-encoded encrypted data (salt + nonce + ciphertext + tag)
/// * `secret` - Device-scoped secret used for encryption
pub fn decrypt_data(encrypted_hex: &str, secret: &str) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    let encrypted_bytes =
        hex::decode(encrypted_hex).map_err(|e| KeyError::Decryption(e.to_string()))?;

    // Minimum size: salt (16) + nonce (12) + tag (16) = 44 bytes
    if encrypted_bytes.len() < 44 {
        return Err(KeyError::Decryption(
            "Data too short (minimum 44 bytes required)".to_string(),
        ));
    }

    let (salt, rest) = encrypted_bytes.split_at(16);
    let (nonce_bytes, ciphertext) = rest.split_at(12);
    let nonce = Nonce::from_slice(nonce_bytes);

    // Derive key with the same PBKDF2 parameters
    let mut key_bytes = Zeroizing::new([0u8; 32]);
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt, 600_000, key_bytes.as_mut());
    let key = aes_gcm::Key::<Aes256Gcm>::from_slice(key_bytes.as_ref());

    let cipher = Aes256Gcm::new(key);

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| KeyError::Decryption(format!("Decryption failed (wrong secret?): {}", e)))?;

    Ok(Zeroizing::new(plaintext))
}

/// Encrypt an Ed25519 seed for at-rest storage
pub fn encrypt_seed(seed: &[u8; 32], secret: &str) -> Result<String, KeyError> {
    encrypt_data(seed, secret)
}

/// Decrypt an Ed25519 seed
pub fn decrypt_seed(encrypted_hex: &str, secret: &str) -> Result<Zeroizing<[u8; 32]>, KeyError> {
    let decrypted = decrypt_data(encrypted_hex, secret)?;

    if decrypted.len() != 32 {
        return Err(KeyError::InvalidKey(format!(
            "Decrypted seed has {} bytes, expected 32",
            decrypted.len()
        )));
    }

    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&decrypted);
    Ok(seed)
}
