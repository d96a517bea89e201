//! MPT Wallet
//!
//! Passkey-bound XRP Ledger wallet core: deterministic key derivation from
//! a platform passkey assertion, encrypted local key storage, and the
//! Multi-Purpose Token (XLS-33) issuance transaction pipeline.

pub mod auth;
pub mod config;
pub mod ledger;
pub mod manager;
pub mod mpt;
pub mod session;
pub mod storage;
pub mod types;
