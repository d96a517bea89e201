//! Ledger account identifiers
//!
//! Classic address encoding: base58check over the 20-byte account id with
//! the Ripple alphabet. The account id is RIPEMD160(SHA256(pubkey)) of the
//! 33-byte ledger-format public key.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Type prefix for classic account addresses
const ACCOUNT_ID_PREFIX: u8 = 0x00;

/// Ed25519 public key prefix in ledger format
pub const ED25519_KEY_PREFIX: u8 = 0xED;

/// Address encoding/decoding errors
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid base58 encoding: {0}")]
    Base58(String),

    #[error("Invalid address checksum")]
    Checksum,

    #[error("Invalid address payload length: {0}")]
    Length(usize),
}

/// Encode a verifying key into the 33-byte ledger public key format
pub fn ledger_public_key(verifying_key: &[u8; 32]) -> [u8; 33] {
    let mut out = [0u8; 33];
    out[0] = ED25519_KEY_PREFIX;
    out[1..].copy_from_slice(verifying_key);
    out
}

/// Compute the 20-byte account id from a ledger-format public key
pub fn account_id(public_key: &[u8; 33]) -> [u8; 20] {
    let sha = Sha256::digest(public_key);
    let ripe = Ripemd160::digest(sha);
    let mut id = [0u8; 20];
    id.copy_from_slice(&ripe);
    id
}

/// Encode a 20-byte account id as a classic address
///
/// Payload is `0x00 || account_id || checksum` where the checksum is the
/// first four bytes of a double SHA-256, base58-encoded with the Ripple
/// alphabet. Classic addresses always start with `r`.
pub fn encode_classic_address(account_id: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(25);
    payload.push(ACCOUNT_ID_PREFIX);
    payload.extend_from_slice(account_id);

    let checksum = double_sha256(&payload);
    payload.extend_from_slice(&checksum[..4]);

    bs58::encode(payload)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .into_string()
}

/// Decode a classic address back to its 20-byte account id
///
/// Verifies the version byte and checksum.
pub fn decode_classic_address(address: &str) -> Result<[u8; 20], AddressError> {
    let payload = bs58::decode(address)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .into_vec()
        .map_err(|e| AddressError::Base58(e.to_string()))?;

    if payload.len() != 25 {
        return Err(AddressError::Length(payload.len()));
    }
    if payload[0] != ACCOUNT_ID_PREFIX {
        return Err(AddressError::Length(payload.len()));
    }

    let (body, checksum) = payload.split_at(21);
    let expected = double_sha256(body);
    if checksum != &expected[..4] {
        return Err(AddressError::Checksum);
    }

    let mut id = [0u8; 20];
    id.copy_from_slice(&body[1..]);
    Ok(id)
}

/// Derive the classic address directly from a verifying key
pub fn address_from_verifying_key(verifying_key: &[u8; 32]) -> String {
    let public_key = ledger_public_key(verifying_key);
    encode_classic_address(&account_id(&public_key))
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trips_through_decode() {
        let key = [0x11u8; 32];
        let address = address_from_verifying_key(&key);
        assert!(address.starts_with('r'), "classic address starts with r");

        let id = decode_classic_address(&address).unwrap();
        assert_eq!(id, account_id(&ledger_public_key(&key)));
    }

    #[test]
    fn address_is_deterministic() {
        let key = [0x22u8; 32];
        assert_eq!(
            address_from_verifying_key(&key),
            address_from_verifying_key(&key)
        );
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let address = address_from_verifying_key(&[0x33u8; 32]);
        // Flip the final character to damage the checksum
        let mut chars: Vec<char> = address.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == 'a' { 'b' } else { 'a' };
        let damaged: String = chars.into_iter().collect();

        assert!(decode_classic_address(&damaged).is_err());
    }

    #[test]
    fn different_keys_produce_different_addresses() {
        assert_ne!(
            address_from_verifying_key(&[0x01u8; 32]),
            address_from_verifying_key(&[0x02u8; 32])
        );
    }
}
