//! Canonical transaction serialization
//!
//! Binary codec for the `MPTokenIssuanceCreate` envelope: fields are
//! emitted in canonical order (sorted by type code, then field code) with
//! the ledger's field headers and variable-length encoding. Signing and
//! transaction hashing use the ledger's domain-separation prefixes.

use sha2::{Digest, Sha512};

/// `MPTokenIssuanceCreate` transaction type code
pub const TT_MPTOKEN_ISSUANCE_CREATE: u16 = 54;

/// Prefix for the payload a transaction signature is computed over ("STX\0")
pub const SIGNING_PREFIX: [u8; 4] = [0x53, 0x54, 0x58, 0x00];

/// Prefix for the transaction hash ("TXN\0")
pub const TXN_HASH_PREFIX: [u8; 4] = [0x54, 0x58, 0x4E, 0x00];

/// Positive/native marker bit in an XRP drops amount
const NATIVE_AMOUNT_POSITIVE: u64 = 0x4000_0000_0000_0000;

/// Issuance flags: holders may lock balances
pub const TF_MPT_CAN_LOCK: u32 = 0x0000_0002;
/// Issuance flags: holders require issuer authorization
pub const TF_MPT_REQUIRE_AUTH: u32 = 0x0000_0004;
/// Issuance flags: tokens can be escrowed
pub const TF_MPT_CAN_ESCROW: u32 = 0x0000_0008;
/// Issuance flags: tokens can be traded on the DEX
pub const TF_MPT_CAN_TRADE: u32 = 0x0000_0010;
/// Issuance flags: tokens can be transferred between non-issuer accounts
pub const TF_MPT_CAN_TRANSFER: u32 = 0x0000_0020;
/// Issuance flags: issuer may claw back balances
pub const TF_MPT_CAN_CLAWBACK: u32 = 0x0000_0040;

/// Unsigned `MPTokenIssuanceCreate` envelope
///
/// Field values are plain Rust types; serialization applies the ledger's
/// canonical binary form.
#[derive(Debug, Clone)]
pub struct IssuanceEnvelope {
    /// Issuing account (20-byte account id)
    pub account: [u8; 20],

    /// Account sequence consumed by this transaction
    pub sequence: u32,

    /// Issuance capability flags (`TF_MPT_*`)
    pub flags: u32,

    /// Secondary-transfer fee in units of 0.001% (basis points / 10)
    pub transfer_fee: u16,

    /// Upper bound on mintable units
    pub maximum_amount: u64,

    /// Decimal-place exponent
    pub asset_scale: u8,

    /// Compact metadata blob (hex-decoded, size-bounded by the caller)
    pub metadata: Vec<u8>,

    /// Transaction fee in drops
    pub fee_drops: u64,

    /// Ledger-format signing public key (0xED || verifying key)
    pub signing_public_key: [u8; 33],
}

impl IssuanceEnvelope {
    /// Payload the detached signature is computed over
    ///
    /// Signing prefix followed by the canonical serialization without
    /// `TxnSignature`.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = SIGNING_PREFIX.to_vec();
        payload.extend_from_slice(&self.serialize(None));
        payload
    }

    /// Canonical serialization of the signed transaction
    pub fn signed_blob(&self, signature: &[u8; 64]) -> Vec<u8> {
        self.serialize(Some(signature))
    }

    /// Serialize in canonical field order
    ///
    /// Canonical order sorts by (type code, field code):
    /// TransactionType (1,2), TransferFee (1,4), Flags (2,2), Sequence (2,4),
    /// MaximumAmount (3,24), Fee (6,8), SigningPubKey (7,3),
    /// TxnSignature (7,4), MPTokenMetadata (7,22), Account (8,1),
    /// AssetScale (16,19).
    fn serialize(&self, signature: Option<&[u8; 64]>) -> Vec<u8> {
        let mut buf = Vec::with_capacity(160 + self.metadata.len());

        push_field_header(&mut buf, 1, 2); // TransactionType
        buf.extend_from_slice(&TT_MPTOKEN_ISSUANCE_CREATE.to_be_bytes());

        if self.transfer_fee != 0 {
            push_field_header(&mut buf, 1, 4); // TransferFee
            buf.extend_from_slice(&self.transfer_fee.to_be_bytes());
        }

        push_field_header(&mut buf, 2, 2); // Flags
        buf.extend_from_slice(&self.flags.to_be_bytes());

        push_field_header(&mut buf, 2, 4); // Sequence
        buf.extend_from_slice(&self.sequence.to_be_bytes());

        push_field_header(&mut buf, 3, 24); // MaximumAmount
        buf.extend_from_slice(&self.maximum_amount.to_be_bytes());

        push_field_header(&mut buf, 6, 8); // Fee
        buf.extend_from_slice(&(NATIVE_AMOUNT_POSITIVE | self.fee_drops).to_be_bytes());

        push_field_header(&mut buf, 7, 3); // SigningPubKey
        push_vl_bytes(&mut buf, &self.signing_public_key);

        if let Some(sig) = signature {
            push_field_header(&mut buf, 7, 4); // TxnSignature
            push_vl_bytes(&mut buf, sig);
        }

        if !self.metadata.is_empty() {
            push_field_header(&mut buf, 7, 22); // MPTokenMetadata
            push_vl_bytes(&mut buf, &self.metadata);
        }

        push_field_header(&mut buf, 8, 1); // Account
        push_vl_bytes(&mut buf, &self.account);

        push_field_header(&mut buf, 16, 19); // AssetScale
        buf.push(self.asset_scale);

        buf
    }
}

/// Content-derived transaction hash of a signed blob (uppercase hex)
pub fn transaction_hash(signed_blob: &[u8]) -> String {
    let mut prefixed = TXN_HASH_PREFIX.to_vec();
    prefixed.extend_from_slice(signed_blob);
    hex::encode_upper(sha512_half(&prefixed))
}

/// Deterministic issuance identifier for a validated issuance
///
/// Ledger-defined derivation: sequence (u32 big-endian) followed by the
/// 20-byte issuer account id, rendered as uppercase hex. Recomputed locally
/// so it never has to be trusted from a network response.
pub fn issuance_id(account: &[u8; 20], sequence: u32) -> String {
    let mut bytes = Vec::with_capacity(24);
    bytes.extend_from_slice(&sequence.to_be_bytes());
    bytes.extend_from_slice(account);
    hex::encode_upper(bytes)
}

/// First 256 bits of SHA-512
fn sha512_half(data: &[u8]) -> [u8; 32] {
    let digest = Sha512::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    out
}

/// Emit a field header for (type code, field code)
fn push_field_header(buf: &mut Vec<u8>, type_code: u8, field_code: u8) {
    match (type_code < 16, field_code < 16) {
        (true, true) => buf.push((type_code << 4) | field_code),
        (true, false) => {
            buf.push(type_code << 4);
            buf.push(field_code);
        }
        (false, true) => {
            buf.push(field_code);
            buf.push(type_code);
        }
        (false, false) => {
            buf.push(0);
            buf.push(type_code);
            buf.push(field_code);
        }
    }
}

/// Emit a variable-length field: length prefix followed by the bytes
fn push_vl_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    push_vl_length(buf, bytes.len());
    buf.extend_from_slice(bytes);
}

/// Ledger variable-length prefix (1-3 bytes depending on length)
fn push_vl_length(buf: &mut Vec<u8>, len: usize) {
    if len <= 192 {
        buf.push(len as u8);
    } else if len <= 12_480 {
        let adjusted = len - 193;
        buf.push(193 + (adjusted >> 8) as u8);
        buf.push((adjusted & 0xFF) as u8);
    } else {
        debug_assert!(len <= 918_744, "VL field too large");
        let adjusted = len - 12_481;
        buf.push(241 + (adjusted >> 16) as u8);
        buf.push(((adjusted >> 8) & 0xFF) as u8);
        buf.push((adjusted & 0xFF) as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_envelope() -> IssuanceEnvelope {
        IssuanceEnvelope {
            account: [0xAB; 20],
            sequence: 7,
            flags: TF_MPT_CAN_TRANSFER | TF_MPT_CAN_TRADE,
            transfer_fee: 250,
            maximum_amount: 1_000_000,
            asset_scale: 2,
            metadata: vec![0x01, 0x02, 0x03],
            fee_drops: 10,
            signing_public_key: {
                let mut pk = [0u8; 33];
                pk[0] = 0xED;
                pk
            },
        }
    }

    #[test]
    fn unsigned_serialization_starts_with_transaction_type() {
        let blob = sample_envelope().serialize(None);
        assert_eq!(blob[0], 0x12, "TransactionType header");
        assert_eq!(&blob[1..3], &TT_MPTOKEN_ISSUANCE_CREATE.to_be_bytes());
    }

    #[test]
    fn zero_transfer_fee_is_omitted() {
        let mut env = sample_envelope();
        let with_fee = env.serialize(None).len();
        env.transfer_fee = 0;
        let without_fee = env.serialize(None).len();
        // Header (1 byte) + u16 value (2 bytes)
        assert_eq!(with_fee - without_fee, 3);
    }

    #[test]
    fn signature_is_included_in_signed_blob_only() {
        let env = sample_envelope();
        let unsigned = env.serialize(None);
        let signed = env.signed_blob(&[0x55; 64]);
        assert!(signed.len() > unsigned.len());
        assert!(signed.windows(64).any(|w| w == [0x55; 64]));
        assert!(!unsigned.windows(64).any(|w| w == [0x55; 64]));
    }

    #[test]
    fn signing_payload_carries_domain_prefix() {
        let payload = sample_envelope().signing_payload();
        assert_eq!(&payload[..4], &SIGNING_PREFIX);
    }

    #[test]
    fn transaction_hash_is_stable_and_signature_dependent() {
        let env = sample_envelope();
        let h1 = transaction_hash(&env.signed_blob(&[0x55; 64]));
        let h2 = transaction_hash(&env.signed_blob(&[0x55; 64]));
        let h3 = transaction_hash(&env.signed_blob(&[0x66; 64]));
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 64);
        assert_eq!(h1.to_uppercase(), h1);
    }

    #[test]
    fn issuance_id_is_sequence_then_account() {
        let id = issuance_id(&[0xAB; 20], 7);
        assert_eq!(id.len(), 48);
        assert!(id.starts_with("00000007"));
        assert!(id.ends_with("ABABABABABABABABABABABABABABABABABABABAB"));
    }

    #[test]
    fn vl_length_boundaries() {
        let mut buf = Vec::new();
        push_vl_length(&mut buf, 192);
        assert_eq!(buf, vec![192]);

        buf.clear();
        push_vl_length(&mut buf, 193);
        assert_eq!(buf, vec![193, 0]);

        buf.clear();
        push_vl_length(&mut buf, 12_480);
        assert_eq!(buf, vec![240, 255]);

        buf.clear();
        push_vl_length(&mut buf, 12_481);
        assert_eq!(buf, vec![241, 0, 0]);
    }
}
