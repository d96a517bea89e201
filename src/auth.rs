//! Passkey/FIDO2 ceremony abstraction
//!
//! The platform credential ceremony is a stateful, callback-driven platform
//! capability. This module narrows it to a single async trait so the wallet
//! core is testable with deterministic stand-ins. The private credential
//! never leaves the authenticator; all the wallet consumes is the
//! per-credential assertion output (WebAuthn PRF-style secret).
//!
//! Real platform backends (browser WebAuthn bridge, USB HID, OS API) are
//! wired in by implementing `PasskeyAuthenticator`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Passkey ceremony errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The platform offers no authenticator
    #[error("No platform authenticator available")]
    CredentialUnavailable,

    /// The user abandoned the ceremony
    #[error("Passkey ceremony cancelled by user")]
    UserCancelled,

    /// The returned credential does not match the one registered for this user
    #[error("Assertion credential does not match registered credential for user")]
    AssertionMismatch,

    /// Platform-level ceremony failure
    #[error("Passkey ceremony failed: {0}")]
    Ceremony(String),
}

/// Deterministic authentication signal produced by a passkey assertion
///
/// `output` is the secret the key derivation consumes. It is stable for a
/// given credential, which is what makes the derived address recoverable
/// after local storage is wiped, as long as the passkey itself persists.
#[derive(Debug)]
pub struct AssertionSignal {
    /// Opaque credential identifier from the authenticator
    pub credential_id: Vec<u8>,

    /// Per-credential secret output (zeroed on drop)
    pub output: Zeroizing<Vec<u8>>,
}

/// Trait abstracting the platform passkey ceremony
///
/// `authenticate` runs registration on first use and assertion thereafter,
/// scoped to an origin-bound credential. It may wait on user interaction,
/// so it is async; it must never be retried silently by the wallet core.
#[async_trait::async_trait]
pub trait PasskeyAuthenticator: Send + Sync {
    /// Run the ceremony for `user_id` and return the assertion signal.
    ///
    /// Side effect: may create a new platform credential on first call.
    /// Writes no application state.
    async fn authenticate(&self, user_id: &str) -> Result<AssertionSignal, AuthError>;
}

/// Deterministic in-memory authenticator
///
/// Simulates a hardware-backed credential: the assertion output is an
/// HMAC-SHA256 of the user id under a device secret, so repeated ceremonies
/// for the same user yield the same signal. Used in tests and local
/// development; production wires a platform backend instead.
pub struct MockAuthenticator {
    device_secret: [u8; 32],
    /// Registered credential id per user (simulates the platform registry)
    registry: Mutex<HashMap<String, Vec<u8>>>,
    /// When false, simulate a platform without an authenticator
    available: bool,
    /// When set, the next ceremony is reported as cancelled by the user
    cancel_next: AtomicBool,
    /// Number of ceremonies performed
    ceremonies: AtomicUsize,
}

impl MockAuthenticator {
    /// Create an authenticator with a deterministic device secret
    pub fn new(device_secret: [u8; 32]) -> Self {
        Self {
            device_secret,
            registry: Mutex::new(HashMap::new()),
            available: true,
            cancel_next: AtomicBool::new(false),
            ceremonies: AtomicUsize::new(0),
        }
    }

    /// Create an authenticator that reports no platform support
    pub fn unavailable() -> Self {
        let mut auth = Self::new([0u8; 32]);
        auth.available = false;
        auth
    }

    /// Make the next ceremony fail as user-cancelled
    pub fn cancel_next(&self) {
        self.cancel_next.store(true, Ordering::SeqCst);
    }

    /// Number of ceremonies performed so far
    pub fn ceremony_count(&self) -> usize {
        self.ceremonies.load(Ordering::SeqCst)
    }

    /// Pre-register a credential id for a user
    ///
    /// Registering an id that differs from the one this device would produce
    /// forces `AssertionMismatch` on the next ceremony.
    pub fn preregister(&self, user_id: &str, credential_id: Vec<u8>) {
        self.registry
            .lock()
            .expect("authenticator registry poisoned")
            .insert(user_id.to_string(), credential_id);
    }

    fn prf(&self, label: &[u8], user_id: &str) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.device_secret)
            .expect("HMAC accepts any key length");
        mac.update(label);
        mac.update(user_id.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

#[async_trait::async_trait]
impl PasskeyAuthenticator for MockAuthenticator {
    async fn authenticate(&self, user_id: &str) -> Result<AssertionSignal, AuthError> {
        if !self.available {
            return Err(AuthError::CredentialUnavailable);
        }
        if self.cancel_next.swap(false, Ordering::SeqCst) {
            return Err(AuthError::UserCancelled);
        }

        self.ceremonies.fetch_add(1, Ordering::SeqCst);

        // Credential id is deterministic per (device, user)
        let credential_id = self.prf(b"credential-id/", user_id)[..16].to_vec();

        // Registration on first use, assertion check thereafter
        {
            let mut registry = self
                .registry
                .lock()
                .expect("authenticator registry poisoned");
            match registry.get(user_id) {
                None => {
                    registry.insert(user_id.to_string(), credential_id.clone());
                }
                Some(registered) if *registered != credential_id => {
                    return Err(AuthError::AssertionMismatch);
                }
                Some(_) => {}
            }
        }

        let output = Zeroizing::new(self.prf(b"prf-output/", user_id));

        Ok(AssertionSignal {
            credential_id,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ceremony_is_deterministic_per_user() {
        let auth = MockAuthenticator::new([0x42; 32]);
        let a = auth.authenticate("user-1").await.unwrap();
        let b = auth.authenticate("user-1").await.unwrap();
        assert_eq!(a.credential_id, b.credential_id);
        assert_eq!(*a.output, *b.output);
        assert_eq!(auth.ceremony_count(), 2);
    }

    #[tokio::test]
    async fn different_users_get_different_signals() {
        let auth = MockAuthenticator::new([0x42; 32]);
        let a = auth.authenticate("user-1").await.unwrap();
        let b = auth.authenticate("user-2").await.unwrap();
        assert_ne!(a.credential_id, b.credential_id);
        assert_ne!(*a.output, *b.output);
    }

    #[tokio::test]
    async fn unavailable_platform_is_reported() {
        let auth = MockAuthenticator::unavailable();
        let err = auth.authenticate("user-1").await.unwrap_err();
        assert!(matches!(err, AuthError::CredentialUnavailable));
    }

    #[tokio::test]
    async fn cancelled_ceremony_is_not_counted() {
        let auth = MockAuthenticator::new([0x42; 32]);
        auth.cancel_next();
        let err = auth.authenticate("user-1").await.unwrap_err();
        assert!(matches!(err, AuthError::UserCancelled));
        assert_eq!(auth.ceremony_count(), 0);
    }

    #[tokio::test]
    async fn foreign_credential_is_a_mismatch() {
        let auth = MockAuthenticator::new([0x42; 32]);
        auth.preregister("user-1", vec![0xAA; 16]);
        let err = auth.authenticate("user-1").await.unwrap_err();
        assert!(matches!(err, AuthError::AssertionMismatch));
    }
}
