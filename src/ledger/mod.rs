//! Ledger network layer
//!
//! Account identifiers, canonical transaction serialization, and the
//! JSON-RPC client the wallet submits through.

pub mod address;
pub mod client;
pub mod codec;

pub use address::{
    address_from_verifying_key, decode_classic_address, encode_classic_address, AddressError,
};
pub use client::{AccountInfo, JsonRpcLedgerClient, LedgerClient, LedgerError};
pub use codec::{issuance_id, transaction_hash, IssuanceEnvelope};
