//! Caller-facing session API
//!
//! The surface consumed by the UI layer: connect a wallet, read its
//! address, and tokenize a funding project. Results are flattened into
//! plain data the presentation layer can render, while keeping error
//! kinds distinguishable ("reconnect wallet" and "try again" are
//! different buttons).

use std::time::Duration;

use crate::auth::PasskeyAuthenticator;
use crate::config::GlobalConfig;
use crate::ledger::client::{JsonRpcLedgerClient, LedgerClient};
use crate::manager::{ManagerError, WalletManager};
use crate::mpt::issuance::{IssuanceError, IssuanceRequest, MpTokenService};
use crate::mpt::metadata::ProjectMetadata;
use crate::storage::secret_store::SecretStore;
use crate::types::TokenizeOutcome;

/// One user session: wallet lifecycle plus the issuance pipeline
pub struct WalletSession<C: LedgerClient> {
    manager: WalletManager,
    service: MpTokenService<C>,
}

impl WalletSession<JsonRpcLedgerClient> {
    /// Build a session from configuration
    ///
    /// Wires a JSON-RPC ledger client from the configured endpoint and the
    /// validation polling knobs.
    pub fn from_config(
        config: &GlobalConfig,
        authenticator: Box<dyn PasskeyAuthenticator>,
        store: Box<dyn SecretStore>,
    ) -> Self {
        let poll_delay = Duration::from_millis(config.ledger.validation_initial_delay_ms);
        let client = JsonRpcLedgerClient::with_poll_delay(&config.ledger.json_rpc_url, poll_delay);

        // Timeout budget: the full backoff schedule, rounded up
        let mut timeout = Duration::ZERO;
        let mut delay = poll_delay;
        for _ in 0..config.ledger.validation_attempts {
            timeout += delay;
            delay = delay.mul_f32(1.5);
        }

        let service = MpTokenService::new(client, config.ledger.base_fee_drops, timeout);
        Self::new(WalletManager::new(authenticator, store), service)
    }
}

impl<C: LedgerClient> WalletSession<C> {
    /// Build a session from already-constructed parts
    pub fn new(manager: WalletManager, service: MpTokenService<C>) -> Self {
        Self { manager, service }
    }

    /// Connect (or silently reconnect) the wallet for a user
    ///
    /// Returns the derived wallet address.
    pub async fn connect_wallet(&mut self, user_id: &str) -> Result<String, ManagerError> {
        self.manager.connect(user_id).await?;
        Ok(self.manager.address()?.to_string())
    }

    /// Address of the connected wallet
    pub fn get_wallet_address(&self) -> Result<&str, ManagerError> {
        self.manager.address()
    }

    /// Disconnect the wallet, keeping the stored record
    pub fn disconnect_wallet(&mut self) {
        self.manager.disconnect();
    }

    /// Access to the wallet manager, for callers that need state inspection
    pub fn manager(&self) -> &WalletManager {
        &self.manager
    }

    /// Tokenize a funding project as a Multi-Purpose Token issuance
    ///
    /// Flattens the typed pipeline result into a UI-consumable outcome.
    /// A failed outcome carries an error code string whose prefix encodes
    /// the error kind (see `error_code`).
    pub async fn tokenize_project(
        &self,
        metadata: ProjectMetadata,
        maximum_amount: &str,
        asset_scale: u8,
        transfer_fee: u16,
    ) -> TokenizeOutcome {
        let request = IssuanceRequest {
            metadata,
            maximum_amount: maximum_amount.to_string(),
            asset_scale,
            transfer_fee,
        };

        match self.service.create_issuance(&self.manager, &request).await {
            Ok(outcome) => TokenizeOutcome {
                success: true,
                transaction_hash: Some(outcome.transaction_hash),
                issuance_id: outcome.issuance_id,
                error: None,
            },
            Err(e) => {
                log::warn!("Tokenization failed: {}", e);
                TokenizeOutcome {
                    success: false,
                    transaction_hash: match &e {
                        IssuanceError::IssuanceStatusUnknown { transaction_hash } => {
                            Some(transaction_hash.clone())
                        }
                        _ => None,
                    },
                    issuance_id: None,
                    error: Some(error_code(&e)),
                }
            }
        }
    }

    /// Re-check the final status of an earlier tokenization
    ///
    /// Required after a `status-unknown` outcome, before starting a new
    /// issuance for the same project.
    pub async fn check_tokenization(&self, transaction_hash: &str) -> TokenizeOutcome {
        match self.service.check_issuance(transaction_hash).await {
            Ok(outcome) => TokenizeOutcome {
                success: outcome.ledger_status == crate::types::LedgerStatus::ValidatedSuccess,
                transaction_hash: Some(outcome.transaction_hash),
                issuance_id: outcome.issuance_id,
                error: match outcome.ledger_status {
                    crate::types::LedgerStatus::ValidatedSuccess => None,
                    status => Some(format!("status:{}", status)),
                },
            },
            Err(e) => TokenizeOutcome {
                success: false,
                transaction_hash: Some(transaction_hash.to_string()),
                issuance_id: None,
                error: Some(error_code(&e)),
            },
        }
    }
}

/// Map a pipeline error to a stable, kind-prefixed code string
fn error_code(error: &IssuanceError) -> String {
    match error {
        IssuanceError::InvalidRequest { field, .. } => format!("invalid-request:{}", field),
        IssuanceError::IssuanceInProgress => "issuance-in-progress".to_string(),
        IssuanceError::IssuanceRejected { code } => format!("rejected:{}", code),
        IssuanceError::IssuanceStatusUnknown { .. } => "status-unknown".to_string(),
        IssuanceError::Wallet(ManagerError::NotConnected) => "wallet:not-connected".to_string(),
        IssuanceError::Wallet(e) => format!("wallet:{}", e),
        IssuanceError::Ledger(e) => format!("network:{}", e),
    }
}
