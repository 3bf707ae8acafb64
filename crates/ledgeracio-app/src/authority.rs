//! Allowlist authority key provisioning.
//!
//! The key is set once and never replaced. A set request against a
//! provisioned store fails before any review is shown.

use ledgeracio_core::error::LedgeracioError;
use ledgeracio_core::types::AuthorityKey;
use ledgeracio_store::AllowlistStore;
use tracing::{info, warn};

use crate::approval::ReviewStep;

pub fn get_authority_key(store: &AllowlistStore) -> Result<AuthorityKey, LedgeracioError> {
    store.authority_key()?.ok_or(LedgeracioError::AuthorityKeyMissing)
}

/// Validate a set request ahead of user review.
pub fn precheck_set(store: &AllowlistStore, data: &[u8]) -> Result<AuthorityKey, LedgeracioError> {
    if store.authority_key()?.is_some() {
        warn!("authority key already provisioned; set request refused");
        return Err(LedgeracioError::AuthorityKeyAlreadySet);
    }
    AuthorityKey::from_slice(data)
}

/// Persist a user-approved authority key.
pub fn commit_set(store: &AllowlistStore, key: &AuthorityKey) -> Result<(), LedgeracioError> {
    store.set_authority_key(key)?;
    info!(key = %key.to_hex(), "allowlist authority key set");
    Ok(())
}

pub fn review_steps(key: &AuthorityKey) -> Vec<ReviewStep> {
    vec![
        ReviewStep::new("Operation", "Set allowlist key"),
        ReviewStep::new("Public key", key.to_hex()),
    ]
}
