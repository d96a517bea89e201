//! Multi-Purpose Token layer
//!
//! Issuance requests, on-ledger metadata, and the transaction pipeline
//! that turns a funding project into a fractional-ownership token.

pub mod issuance;
pub mod metadata;

pub use issuance::{
    IssuanceError, IssuanceRequest, MpTokenService, MAX_ASSET_SCALE, MAX_TRANSFER_FEE,
};
pub use metadata::{MetadataError, ProjectMetadata, MAX_METADATA_BYTES};
