//! Allowlist upload pipeline.
//!
//! Checks run in order, all before the user is asked anything:
//! 1. an authority key is provisioned
//! 2. the payload length matches its declared entry count
//! 3. the signature verifies under the authority key
//! 4. the nonce is newer than the committed allowlist's
//!
//! Only an approved upload reaches [`commit_upload`], which replaces the
//! committed allowlist in one write.

use ledgeracio_core::allowlist::{AllowlistPayload, CommittedAllowlist};
use ledgeracio_core::error::LedgeracioError;
use ledgeracio_core::types::ContentHash;
use ledgeracio_crypto::{content_hash, verify_allowlist};
use ledgeracio_store::AllowlistStore;
use tracing::{info, warn};

use crate::approval::ReviewStep;

/// An upload that passed every pre-review check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedUpload {
    pub payload: AllowlistPayload,
    pub hash: ContentHash,
}

pub fn get_allowlist_hash(store: &AllowlistStore) -> Result<ContentHash, LedgeracioError> {
    store
        .committed_allowlist()?
        .map(|c| c.hash)
        .ok_or(LedgeracioError::AllowlistMissing)
}

pub fn prepare_upload(
    store: &AllowlistStore,
    data: &[u8],
    max_entries: u32,
) -> Result<VerifiedUpload, LedgeracioError> {
    let authority = store.authority_key()?.ok_or_else(|| {
        warn!("allowlist upload without authority key");
        LedgeracioError::AuthorityKeyMissing
    })?;

    let payload = AllowlistPayload::decode(data, max_entries)?;

    verify_allowlist(&authority, &payload).map_err(|e| {
        warn!(nonce = payload.nonce, error = %e, "allowlist signature rejected");
        LedgeracioError::InvalidSignature
    })?;

    if let Some(committed) = store.committed_allowlist()? {
        if payload.nonce <= committed.nonce {
            warn!(committed = committed.nonce, got = payload.nonce, "stale allowlist nonce");
            return Err(LedgeracioError::StaleNonce {
                committed: committed.nonce,
                got: payload.nonce,
            });
        }
    }

    let hash = content_hash(payload.nonce, &payload.entries);
    Ok(VerifiedUpload { payload, hash })
}

pub fn commit_upload(
    store: &AllowlistStore,
    upload: VerifiedUpload,
) -> Result<ContentHash, LedgeracioError> {
    let VerifiedUpload { payload, hash } = upload;
    let committed = CommittedAllowlist {
        nonce: payload.nonce,
        hash,
        entries: payload.entries,
    };
    store.commit_allowlist(&committed)?;
    info!(nonce = committed.nonce, entries = committed.entries.len(), %hash, "allowlist committed");
    Ok(hash)
}

pub fn review_steps(upload: &VerifiedUpload) -> Vec<ReviewStep> {
    let hash = upload.hash.to_hex();
    vec![
        ReviewStep::new(
            "Upload allowlist",
            format!("nonce {}, {} entries", upload.payload.nonce, upload.payload.count()),
        ),
        ReviewStep::new("Hash", format!("{}…{}", &hash[..8], &hash[56..])),
    ]
}
