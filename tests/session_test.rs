//! Integration tests for the caller-facing session surface

mod common;

use std::time::Duration;

use common::StubLedger;
use mpt_wallet::auth::MockAuthenticator;
use mpt_wallet::manager::{WalletManager, WalletState};
use mpt_wallet::mpt::issuance::MpTokenService;
use mpt_wallet::mpt::metadata::ProjectMetadata;
use mpt_wallet::session::WalletSession;
use mpt_wallet::storage::secret_store::MemorySecretStore;
use mpt_wallet::types::LedgerStatus;

fn session(ledger: &StubLedger) -> WalletSession<&StubLedger> {
    common::init_logging();
    let manager = WalletManager::new(
        Box::new(MockAuthenticator::new([0x42; 32])),
        Box::new(MemorySecretStore::new()),
    );
    WalletSession::new(
        manager,
        MpTokenService::new(ledger, 12, Duration::from_secs(5)),
    )
}

fn sample_metadata() -> ProjectMetadata {
    ProjectMetadata {
        project_ref: "proj-001".to_string(),
        ticker: "SOLAR".to_string(),
        name: "Solar Farm Alpha".to_string(),
        asset_class: "infrastructure".to_string(),
        description: "Fractional ownership of a solar installation".to_string(),
    }
}

#[tokio::test]
async fn connect_returns_the_wallet_address() {
    let ledger = StubLedger::new(7);
    let mut session = session(&ledger);

    let address = session.connect_wallet("user-42").await.unwrap();
    assert!(address.starts_with('r'));
    assert_eq!(session.get_wallet_address().unwrap(), address);

    session.disconnect_wallet();
    assert_eq!(session.manager().state(), WalletState::Disconnected);
    assert!(session.get_wallet_address().is_err());
}

#[tokio::test]
async fn tokenize_project_flattens_a_success() {
    let ledger = StubLedger::new(7);
    ledger.set_hash_override("H1");
    let mut session = session(&ledger);
    session.connect_wallet("user-42").await.unwrap();

    let outcome = session
        .tokenize_project(sample_metadata(), "1000000", 2, 0)
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.transaction_hash.as_deref(), Some("H1"));
    assert!(outcome.issuance_id.is_some());
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn tokenize_without_wallet_reports_not_connected() {
    let ledger = StubLedger::new(7);
    let session = session(&ledger);

    let outcome = session
        .tokenize_project(sample_metadata(), "1000000", 2, 0)
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("wallet:not-connected"));
    assert_eq!(ledger.submission_count(), 0);
}

#[tokio::test]
async fn tokenize_error_codes_are_kind_prefixed() {
    let ledger = StubLedger::new(7);
    let mut session = session(&ledger);
    session.connect_wallet("user-42").await.unwrap();

    let outcome = session
        .tokenize_project(sample_metadata(), "0", 2, 0)
        .await;
    assert_eq!(
        outcome.error.as_deref(),
        Some("invalid-request:maximum_amount")
    );

    ledger.set_submit_result("temBAD_SEQUENCE");
    let outcome = session
        .tokenize_project(sample_metadata(), "1000000", 2, 0)
        .await;
    assert_eq!(outcome.error.as_deref(), Some("rejected:temBAD_SEQUENCE"));
}

#[tokio::test]
async fn unknown_status_keeps_the_hash_for_reconciliation() {
    let ledger = StubLedger::new(7);
    ledger.set_hash_override("H1");
    ledger.set_validation(LedgerStatus::TimedOut, "");
    let mut session = session(&ledger);
    session.connect_wallet("user-42").await.unwrap();

    let outcome = session
        .tokenize_project(sample_metadata(), "1000000", 2, 0)
        .await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("status-unknown"));
    assert_eq!(outcome.transaction_hash.as_deref(), Some("H1"));

    // The pipeline later observes the transaction in a validated ledger
    ledger.set_validation(LedgerStatus::ValidatedSuccess, "tesSUCCESS");
    let resolved = session.check_tokenization("H1").await;
    assert!(resolved.success);
    assert_eq!(resolved.transaction_hash.as_deref(), Some("H1"));
}

#[tokio::test]
async fn check_tokenization_reports_a_validated_failure() {
    let ledger = StubLedger::new(7);
    ledger.set_validation(LedgerStatus::ValidatedFailure, "tecINSUFFICIENT_RESERVE");
    let session = session(&ledger);

    let outcome = session.check_tokenization("H1").await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("status:validated-failure"));
}
