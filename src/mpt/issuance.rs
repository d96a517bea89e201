//! Token issuance pipeline
//!
//! Builds, signs, submits, and reconciles `MPTokenIssuanceCreate`
//! transactions. Local validation runs before any signing or network I/O,
//! and at most one issuance per wallet is in flight at a time because
//! sequence-number allocation cannot be interleaved safely.

use std::time::Duration;
use tokio::sync::Mutex;

use crate::ledger::client::{LedgerClient, LedgerError};
use crate::ledger::codec::{self, IssuanceEnvelope, TF_MPT_CAN_TRADE, TF_MPT_CAN_TRANSFER};
use crate::manager::{ManagerError, WalletManager};
use crate::mpt::metadata::{MetadataError, ProjectMetadata};
use crate::types::{LedgerStatus, SubmissionOutcome};

/// Largest accepted decimal-place exponent
pub const MAX_ASSET_SCALE: u8 = 19;

/// Largest accepted transfer fee, in units of 0.001% (50%)
pub const MAX_TRANSFER_FEE: u16 = 50_000;

/// Token issuance errors
#[derive(Debug, thiserror::Error)]
pub enum IssuanceError {
    /// Request failed local validation; nothing was signed or submitted
    #[error("Invalid issuance request field '{field}': {reason}")]
    InvalidRequest {
        field: &'static str,
        reason: String,
    },

    /// Another issuance for this wallet is already in flight
    #[error("An issuance is already in progress for this wallet")]
    IssuanceInProgress,

    /// The transaction reached the ledger and was refused
    ///
    /// Not retried here: a rejected transaction consumed a sequence number,
    /// so a retry must fetch a fresh sequence, which a new call does.
    #[error("Issuance rejected by ledger: {code}")]
    IssuanceRejected { code: String },

    /// The validation window elapsed; the outcome is unknown
    ///
    /// The transaction may still validate. Re-check its final status via
    /// `check_issuance` before attempting a new issuance for the same
    /// intent.
    #[error("Issuance status unknown for transaction {transaction_hash}")]
    IssuanceStatusUnknown { transaction_hash: String },

    #[error("Wallet error: {0}")]
    Wallet(#[from] ManagerError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// A pending intent to create a tokenized asset
#[derive(Debug, Clone)]
pub struct IssuanceRequest {
    /// Project display fields, stored on-ledger as a compact blob
    pub metadata: ProjectMetadata,

    /// Upper bound on mintable units (ledger-encoded as string)
    pub maximum_amount: String,

    /// Decimal-place exponent
    pub asset_scale: u8,

    /// Secondary-transfer fee in units of 0.001%
    pub transfer_fee: u16,
}

/// Builds and submits token-issuance transactions
///
/// Uses the wallet manager for signing and the ledger client for all
/// network I/O. One instance per wallet session.
pub struct MpTokenService<C: LedgerClient> {
    client: C,
    base_fee_drops: u64,
    validation_timeout: Duration,
    /// Serializes issuances; `try_lock` makes a concurrent call fail fast
    in_flight: Mutex<()>,
}

impl<C: LedgerClient> MpTokenService<C> {
    /// Create a service over the given ledger client
    ///
    /// # Arguments
    ///
    /// * `client` - Ledger network client
    /// * `base_fee_drops` - Transaction fee basis in drops
    /// * `validation_timeout` - Upper bound on waiting for validation
    pub fn new(client: C, base_fee_drops: u64, validation_timeout: Duration) -> Self {
        Self {
            client,
            base_fee_drops,
            validation_timeout,
            in_flight: Mutex::new(()),
        }
    }

    /// The underlying ledger client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Create a token issuance for the connected wallet
    ///
    /// # Process
    ///
    /// 1. Validate the request locally (fails fast, before any network call)
    /// 2. Fetch the current account sequence from the ledger
    /// 3. Build the unsigned envelope
    /// 4. Sign via the wallet manager (the key never leaves it)
    /// 5. Submit the signed blob
    /// 6. Await validation with a bounded timeout
    /// 7. On success, recompute the issuance id locally from (account, sequence)
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` before any side effect
    /// - `IssuanceInProgress` when another call for this wallet is in flight
    /// - `IssuanceRejected` on preliminary rejection or validated failure
    /// - `IssuanceStatusUnknown` when the validation window elapses
    pub async fn create_issuance(
        &self,
        wallet: &WalletManager,
        request: &IssuanceRequest,
    ) -> Result<SubmissionOutcome, IssuanceError> {
        // Fail fast on a concurrent issuance; never queue behind one, since
        // the first may consume the sequence this one would fetch.
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| IssuanceError::IssuanceInProgress)?;

        // 1. Local validation, before sign and before any network call
        let (maximum_amount, metadata_blob) = validate_request(request)?;

        let address = wallet.address()?.to_string();
        let account = wallet.account_id()?;

        // 2. Fetch sequence and fee basis
        let account_info = self.client.get_account_info(&address).await?;
        log::debug!(
            "Account {} at sequence {}, balance {} drops (reserve {})",
            address,
            account_info.sequence,
            account_info.balance_drops,
            account_info.reserve_drops
        );

        // 3. Build the unsigned envelope. Issued tokens are transferable
        // and tradable; a non-zero transfer fee requires transferability.
        let envelope = IssuanceEnvelope {
            account,
            sequence: account_info.sequence,
            flags: TF_MPT_CAN_TRANSFER | TF_MPT_CAN_TRADE,
            transfer_fee: request.transfer_fee,
            maximum_amount,
            asset_scale: request.asset_scale,
            metadata: metadata_blob,
            fee_drops: self.base_fee_drops,
            signing_public_key: *wallet.public_key()?,
        };

        // 4. Detached signature; the private key stays in the manager
        let signature = wallet.sign(&envelope.signing_payload())?;
        let signed_blob = envelope.signed_blob(&signature);
        let blob_hex = hex::encode_upper(&signed_blob);

        // 5. Submit
        let submitted = self.client.submit(&blob_hex).await?;
        if submitted.ledger_status == LedgerStatus::RejectedPreliminary {
            return Err(IssuanceError::IssuanceRejected {
                code: submitted
                    .engine_result
                    .unwrap_or_else(|| "unknown".to_string()),
            });
        }

        // 6. Await a terminal status
        let outcome = self
            .client
            .await_validation(&submitted.transaction_hash, self.validation_timeout)
            .await?;

        match outcome.ledger_status {
            LedgerStatus::ValidatedSuccess => {
                // 7. Issuance id is derived from (account, sequence) by the
                // ledger; recompute it locally rather than trusting the
                // response.
                let issuance_id = codec::issuance_id(&account, account_info.sequence);
                log::info!(
                    "Issuance {} validated in transaction {}",
                    issuance_id,
                    outcome.transaction_hash
                );
                Ok(SubmissionOutcome {
                    issuance_id: Some(issuance_id),
                    ..outcome
                })
            }
            LedgerStatus::ValidatedFailure => Err(IssuanceError::IssuanceRejected {
                code: outcome
                    .engine_result
                    .unwrap_or_else(|| "unknown".to_string()),
            }),
            LedgerStatus::TimedOut => Err(IssuanceError::IssuanceStatusUnknown {
                transaction_hash: outcome.transaction_hash,
            }),
            // await_validation only returns terminal states or TimedOut
            LedgerStatus::Queued | LedgerStatus::RejectedPreliminary => {
                Err(IssuanceError::IssuanceStatusUnknown {
                    transaction_hash: outcome.transaction_hash,
                })
            }
        }
    }

    /// Re-check the final status of a previously submitted issuance
    ///
    /// The reconciliation step after `IssuanceStatusUnknown`: one status
    /// lookup, no resubmission. The caller must not start a new issuance
    /// for the same intent until this returns a terminal outcome.
    pub async fn check_issuance(
        &self,
        transaction_hash: &str,
    ) -> Result<SubmissionOutcome, IssuanceError> {
        let outcome = self
            .client
            .await_validation(transaction_hash, Duration::ZERO)
            .await?;
        Ok(outcome)
    }
}

/// Validate request fields locally
///
/// Returns the parsed maximum amount and the encoded metadata blob.
fn validate_request(request: &IssuanceRequest) -> Result<(u64, Vec<u8>), IssuanceError> {
    let maximum_amount: u64 = request.maximum_amount.parse().map_err(|_| {
        IssuanceError::InvalidRequest {
            field: "maximum_amount",
            reason: format!(
                "'{}' is not an unsigned integer",
                request.maximum_amount
            ),
        }
    })?;
    if maximum_amount == 0 {
        return Err(IssuanceError::InvalidRequest {
            field: "maximum_amount",
            reason: "must be greater than zero".to_string(),
        });
    }

    if request.asset_scale > MAX_ASSET_SCALE {
        return Err(IssuanceError::InvalidRequest {
            field: "asset_scale",
            reason: format!(
                "{} exceeds ledger limit {}",
                request.asset_scale, MAX_ASSET_SCALE
            ),
        });
    }

    if request.transfer_fee > MAX_TRANSFER_FEE {
        return Err(IssuanceError::InvalidRequest {
            field: "transfer_fee",
            reason: format!(
                "{} exceeds ledger limit {}",
                request.transfer_fee, MAX_TRANSFER_FEE
            ),
        });
    }

    if request.metadata.ticker.trim().is_empty() {
        return Err(IssuanceError::InvalidRequest {
            field: "metadata.ticker",
            reason: "must not be empty".to_string(),
        });
    }

    let metadata_blob = request.metadata.encode().map_err(|e| match e {
        MetadataError::TooLarge(size) => IssuanceError::InvalidRequest {
            field: "metadata",
            reason: format!("serialized size {} exceeds ledger limit", size),
        },
        MetadataError::Serialization(e) => IssuanceError::InvalidRequest {
            field: "metadata",
            reason: e.to_string(),
        },
    })?;

    Ok((maximum_amount, metadata_blob))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> IssuanceRequest {
        IssuanceRequest {
            metadata: ProjectMetadata {
                project_ref: "proj-001".to_string(),
                ticker: "SOLAR".to_string(),
                name: "Solar Farm Alpha".to_string(),
                asset_class: "infrastructure".to_string(),
                description: "Fractional ownership".to_string(),
            },
            maximum_amount: "1000".to_string(),
            asset_scale: 0,
            transfer_fee: 0,
        }
    }

    #[test]
    fn valid_request_passes() {
        let (amount, blob) = validate_request(&sample_request()).unwrap();
        assert_eq!(amount, 1000);
        assert!(!blob.is_empty());
    }

    #[test]
    fn zero_amount_is_invalid() {
        let mut request = sample_request();
        request.maximum_amount = "0".to_string();
        let err = validate_request(&request).unwrap_err();
        assert!(matches!(
            err,
            IssuanceError::InvalidRequest {
                field: "maximum_amount",
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_amount_is_invalid() {
        let mut request = sample_request();
        request.maximum_amount = "lots".to_string();
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn excessive_scale_is_invalid() {
        let mut request = sample_request();
        request.asset_scale = MAX_ASSET_SCALE + 1;
        let err = validate_request(&request).unwrap_err();
        assert!(matches!(
            err,
            IssuanceError::InvalidRequest {
                field: "asset_scale",
                ..
            }
        ));
    }

    #[test]
    fn excessive_transfer_fee_is_invalid() {
        let mut request = sample_request();
        request.transfer_fee = MAX_TRANSFER_FEE + 1;
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn empty_ticker_is_invalid() {
        let mut request = sample_request();
        request.metadata.ticker = "  ".to_string();
        let err = validate_request(&request).unwrap_err();
        assert!(matches!(
            err,
            IssuanceError::InvalidRequest {
                field: "metadata.ticker",
                ..
            }
        ));
    }
}
