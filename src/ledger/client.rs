//! Ledger network client
//!
//! Stateless JSON-RPC adapter to the ledger node: account lookup,
//! transaction submission, and polling for a validated outcome. All
//! methods suspend at the network boundary and never retry a submission
//! on their own.

use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;

use crate::ledger::codec;
use crate::types::{LedgerStatus, SubmissionOutcome};

/// Base account reserve in drops
const BASE_RESERVE_DROPS: u64 = 10_000_000;

/// Per-owned-object reserve in drops
const OWNER_RESERVE_DROPS: u64 = 2_000_000;

/// Ledger network errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Rate limited by ledger node")]
    RateLimited,

    #[error("Ledger rejected request: {code}")]
    LedgerRejected { code: String },

    #[error("Account not found on ledger: {0}")]
    AccountNotFound(String),

    #[error("Malformed ledger response: {0}")]
    MalformedResponse(String),
}

/// Account state relevant to transaction construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    /// Next transaction sequence for the account
    pub sequence: u32,

    /// Spendable balance in drops
    pub balance_drops: u64,

    /// Number of owned ledger objects
    pub owner_count: u32,

    /// Reserved balance in drops (base + per-object)
    pub reserve_drops: u64,
}

/// Client-side view of the ledger network API
///
/// `await_validation` polls until a terminal status or the timeout elapses;
/// a timeout yields a `TimedOut` outcome, which the caller must treat as
/// "unknown": the transaction may still validate later, so resubmission
/// without a fresh status check risks double-issuance.
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch sequence, balance, and reserve for an account
    async fn get_account_info(&self, address: &str) -> Result<AccountInfo, LedgerError>;

    /// Submit a signed transaction blob (uppercase hex)
    ///
    /// Returns the initial outcome: `Queued` when the node accepted the
    /// transaction provisionally, `RejectedPreliminary` when it refused it
    /// up front.
    async fn submit(&self, signed_blob_hex: &str) -> Result<SubmissionOutcome, LedgerError>;

    /// Poll for a terminal outcome of a previously submitted transaction
    async fn await_validation(
        &self,
        transaction_hash: &str,
        timeout: Duration,
    ) -> Result<SubmissionOutcome, LedgerError>;
}

/// JSON-RPC ledger client over HTTP
pub struct JsonRpcLedgerClient {
    http: reqwest::Client,
    url: String,
    /// Initial delay between validation polls; backs off 1.5x per round
    poll_initial_delay: Duration,
}

impl JsonRpcLedgerClient {
    /// Create a client for the given JSON-RPC endpoint
    pub fn new(url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.to_string(),
            poll_initial_delay: Duration::from_millis(1_000),
        }
    }

    /// Create a client with a custom initial polling delay
    pub fn with_poll_delay(url: &str, poll_initial_delay: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.to_string(),
            poll_initial_delay,
        }
    }

    /// The JSON-RPC endpoint this client talks to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Perform one JSON-RPC call and return the `result` object
    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let body = json!({
            "method": method,
            "params": [params],
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::NetworkUnavailable(e.to_string()))?;

        if response.status().as_u16() == 429 {
            return Err(LedgerError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(LedgerError::NetworkUnavailable(format!(
                "HTTP {} from ledger node",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::MalformedResponse(e.to_string()))?;

        let result = payload
            .get("result")
            .cloned()
            .ok_or_else(|| LedgerError::MalformedResponse("missing result object".to_string()))?;

        if result.get("status").and_then(Value::as_str) == Some("error") {
            let code = result
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            if code == "slowDown" || code == "tooBusy" {
                return Err(LedgerError::RateLimited);
            }
            return Err(LedgerError::LedgerRejected { code });
        }

        Ok(result)
    }
}

#[async_trait::async_trait]
impl LedgerClient for JsonRpcLedgerClient {
    async fn get_account_info(&self, address: &str) -> Result<AccountInfo, LedgerError> {
        let result = self
            .call(
                "account_info",
                json!({ "account": address, "ledger_index": "validated" }),
            )
            .await
            .map_err(|e| match e {
                LedgerError::LedgerRejected { code } if code == "actNotFound" => {
                    LedgerError::AccountNotFound(address.to_string())
                }
                other => other,
            })?;

        let account_data = result
            .get("account_data")
            .ok_or_else(|| LedgerError::MalformedResponse("missing account_data".to_string()))?;

        let sequence = account_data
            .get("Sequence")
            .and_then(Value::as_u64)
            .ok_or_else(|| LedgerError::MalformedResponse("missing Sequence".to_string()))?
            as u32;

        let balance_drops = account_data
            .get("Balance")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| LedgerError::MalformedResponse("missing Balance".to_string()))?;

        let owner_count = account_data
            .get("OwnerCount")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32;

        Ok(AccountInfo {
            sequence,
            balance_drops,
            owner_count,
            reserve_drops: BASE_RESERVE_DROPS + u64::from(owner_count) * OWNER_RESERVE_DROPS,
        })
    }

    async fn submit(&self, signed_blob_hex: &str) -> Result<SubmissionOutcome, LedgerError> {
        // Hash is recomputed locally from the blob rather than read from the
        // response, so a misbehaving node cannot redirect status polling.
        let blob = hex::decode(signed_blob_hex)
            .map_err(|e| LedgerError::MalformedResponse(format!("invalid tx blob hex: {}", e)))?;
        let transaction_hash = codec::transaction_hash(&blob);

        let result = self
            .call("submit", json!({ "tx_blob": signed_blob_hex }))
            .await?;

        let engine_result = result
            .get("engine_result")
            .and_then(Value::as_str)
            .ok_or_else(|| LedgerError::MalformedResponse("missing engine_result".to_string()))?
            .to_string();

        log::info!(
            "Submitted transaction {}: engine_result={}",
            transaction_hash,
            engine_result
        );

        // tes = provisional success, ter = retryable hold, tec = will be
        // included but fail (claims a fee). All three reach a validated
        // ledger, so they stay queued; tem/tef never will.
        let outcome = if engine_result.starts_with("tes")
            || engine_result.starts_with("ter")
            || engine_result.starts_with("tec")
        {
            SubmissionOutcome::queued(transaction_hash, Some(engine_result))
        } else {
            SubmissionOutcome::rejected(transaction_hash, engine_result)
        };

        Ok(outcome)
    }

    async fn await_validation(
        &self,
        transaction_hash: &str,
        timeout: Duration,
    ) -> Result<SubmissionOutcome, LedgerError> {
        let deadline = Instant::now() + timeout;
        let mut delay = self.poll_initial_delay;

        loop {
            match self
                .call(
                    "tx",
                    json!({ "transaction": transaction_hash, "binary": false }),
                )
                .await
            {
                Ok(result) => {
                    if result.get("validated").and_then(Value::as_bool) == Some(true) {
                        let code = result
                            .get("meta")
                            .and_then(|m| m.get("TransactionResult"))
                            .and_then(Value::as_str)
                            .ok_or_else(|| {
                                LedgerError::MalformedResponse(
                                    "validated tx without TransactionResult".to_string(),
                                )
                            })?
                            .to_string();

                        let status = if code == "tesSUCCESS" {
                            LedgerStatus::ValidatedSuccess
                        } else {
                            LedgerStatus::ValidatedFailure
                        };

                        log::info!(
                            "Transaction {} validated: {} ({})",
                            transaction_hash,
                            status,
                            code
                        );

                        return Ok(SubmissionOutcome {
                            transaction_hash: transaction_hash.to_string(),
                            ledger_status: status,
                            engine_result: Some(code),
                            issuance_id: None,
                        });
                    }
                    // Known but not yet validated; keep polling
                }
                // Not found yet is expected while the transaction propagates
                Err(LedgerError::LedgerRejected { code }) if code == "txnNotFound" => {}
                Err(other) => return Err(other),
            }

            if Instant::now() + delay > deadline {
                log::warn!(
                    "Validation window elapsed for {}; outcome unknown",
                    transaction_hash
                );
                return Ok(SubmissionOutcome::timed_out(transaction_hash.to_string()));
            }

            tokio::time::sleep(delay).await;
            delay = delay.mul_f32(1.5);
        }
    }
}

impl std::fmt::Debug for JsonRpcLedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcLedgerClient")
            .field("url", &self.url)
            .finish()
    }
}
