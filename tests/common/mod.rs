//! Shared test doubles
//!
//! A scriptable ledger stub so pipeline tests run without a network.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use mpt_wallet::ledger::client::{AccountInfo, LedgerClient, LedgerError};
use mpt_wallet::ledger::codec;
use mpt_wallet::types::{LedgerStatus, SubmissionOutcome};

/// Initialize logging for a test binary; safe to call repeatedly
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Scriptable in-memory ledger
///
/// Records every submission and answers with configured results, so tests
/// can assert exactly what reached the network.
pub struct StubLedger {
    /// Sequence returned by `get_account_info`
    pub sequence: AtomicU32,

    /// Engine result returned at submit time (e.g. "tesSUCCESS")
    pub submit_result: Mutex<String>,

    /// Terminal status returned by `await_validation`
    pub validation_status: Mutex<LedgerStatus>,

    /// Engine result attached to the validated outcome
    pub validation_result: Mutex<String>,

    /// Overrides the locally computed transaction hash when set
    pub hash_override: Mutex<Option<String>>,

    /// Artificial suspension inside `get_account_info`
    pub account_info_delay: Duration,

    /// Submitted signed blobs (hex), in order
    pub submissions: Mutex<Vec<String>>,

    /// Number of `get_account_info` calls
    pub account_info_calls: AtomicUsize,
}

impl StubLedger {
    pub fn new(sequence: u32) -> Self {
        Self {
            sequence: AtomicU32::new(sequence),
            submit_result: Mutex::new("tesSUCCESS".to_string()),
            validation_status: Mutex::new(LedgerStatus::ValidatedSuccess),
            validation_result: Mutex::new("tesSUCCESS".to_string()),
            hash_override: Mutex::new(None),
            account_info_delay: Duration::ZERO,
            submissions: Mutex::new(Vec::new()),
            account_info_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_submit_result(&self, code: &str) {
        *self.submit_result.lock().unwrap() = code.to_string();
    }

    pub fn set_validation(&self, status: LedgerStatus, code: &str) {
        *self.validation_status.lock().unwrap() = status;
        *self.validation_result.lock().unwrap() = code.to_string();
    }

    pub fn set_hash_override(&self, hash: &str) {
        *self.hash_override.lock().unwrap() = Some(hash.to_string());
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    fn hash_for(&self, blob_hex: &str) -> String {
        if let Some(hash) = self.hash_override.lock().unwrap().clone() {
            return hash;
        }
        let blob = hex::decode(blob_hex).expect("stub received invalid hex blob");
        codec::transaction_hash(&blob)
    }
}

#[async_trait::async_trait]
impl<'a> LedgerClient for &'a StubLedger {
    async fn get_account_info(&self, _address: &str) -> Result<AccountInfo, LedgerError> {
        self.account_info_calls.fetch_add(1, Ordering::SeqCst);
        if !self.account_info_delay.is_zero() {
            tokio::time::sleep(self.account_info_delay).await;
        }
        Ok(AccountInfo {
            sequence: self.sequence.load(Ordering::SeqCst),
            balance_drops: 100_000_000,
            owner_count: 0,
            reserve_drops: 10_000_000,
        })
    }

    async fn submit(&self, signed_blob_hex: &str) -> Result<SubmissionOutcome, LedgerError> {
        self.submissions
            .lock()
            .unwrap()
            .push(signed_blob_hex.to_string());

        let hash = self.hash_for(signed_blob_hex);
        let code = self.submit_result.lock().unwrap().clone();

        if code.starts_with("tes") {
            Ok(SubmissionOutcome::queued(hash, Some(code)))
        } else {
            Ok(SubmissionOutcome::rejected(hash, code))
        }
    }

    async fn await_validation(
        &self,
        transaction_hash: &str,
        _timeout: Duration,
    ) -> Result<SubmissionOutcome, LedgerError> {
        let status = *self.validation_status.lock().unwrap();
        match status {
            LedgerStatus::TimedOut => Ok(SubmissionOutcome::timed_out(
                transaction_hash.to_string(),
            )),
            status => Ok(SubmissionOutcome {
                transaction_hash: transaction_hash.to_string(),
                ledger_status: status,
                engine_result: Some(self.validation_result.lock().unwrap().clone()),
                issuance_id: None,
            }),
        }
    }
}
