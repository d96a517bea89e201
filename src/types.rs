//! Shared types for mpt-wallet
//!
//! Common data structures used across the wallet implementation.

use serde::{Deserialize, Serialize};

/// Terminal and non-terminal ledger states of a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerStatus {
    /// Accepted by the node, not yet in a validated ledger
    Queued,

    /// Included in a validated ledger and applied successfully
    ValidatedSuccess,

    /// Included in a validated ledger but failed (consumed a sequence number)
    ValidatedFailure,

    /// Refused at submission time, before reaching a validated ledger
    RejectedPreliminary,

    /// No terminal state observed within the polling window.
    /// The transaction may still validate later; treat as "unknown", not failure.
    TimedOut,
}

impl LedgerStatus {
    /// Whether this status is terminal (no further state change expected)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LedgerStatus::ValidatedSuccess
                | LedgerStatus::ValidatedFailure
                | LedgerStatus::RejectedPreliminary
        )
    }
}

impl std::fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerStatus::Queued => write!(f, "queued"),
            LedgerStatus::ValidatedSuccess => write!(f, "validated-success"),
            LedgerStatus::ValidatedFailure => write!(f, "validated-failure"),
            LedgerStatus::RejectedPreliminary => write!(f, "rejected-preliminary"),
            LedgerStatus::TimedOut => write!(f, "timed-out"),
        }
    }
}

/// Result of one submission attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    /// Content-derived transaction identifier (uppercase hex)
    pub transaction_hash: String,

    /// Ledger status at the time this outcome was produced
    pub ledger_status: LedgerStatus,

    /// Engine result code reported by the ledger (e.g. "tesSUCCESS", "temBAD_SEQUENCE")
    pub engine_result: Option<String>,

    /// Issuance identifier; present only on validated-success of an issuance transaction
    pub issuance_id: Option<String>,
}

impl SubmissionOutcome {
    /// Outcome for a submission the node accepted but has not validated yet
    pub fn queued(transaction_hash: String, engine_result: Option<String>) -> Self {
        Self {
            transaction_hash,
            ledger_status: LedgerStatus::Queued,
            engine_result,
            issuance_id: None,
        }
    }

    /// Outcome for a submission the node refused up front
    pub fn rejected(transaction_hash: String, engine_result: String) -> Self {
        Self {
            transaction_hash,
            ledger_status: LedgerStatus::RejectedPreliminary,
            engine_result: Some(engine_result),
            issuance_id: None,
        }
    }

    /// Outcome for a polling window that elapsed without a terminal state
    pub fn timed_out(transaction_hash: String) -> Self {
        Self {
            transaction_hash,
            ledger_status: LedgerStatus::TimedOut,
            engine_result: None,
            issuance_id: None,
        }
    }
}

/// Flat result surfaced to the UI layer by `tokenize_project`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizeOutcome {
    pub success: bool,

    /// Present whenever the transaction was actually submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,

    /// Present only on validated success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuance_id: Option<String>,

    /// Error description when success is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
