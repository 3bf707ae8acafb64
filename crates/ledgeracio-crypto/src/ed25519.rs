use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

use ledgeracio_core::allowlist::AllowlistPayload;
use ledgeracio_core::types::AuthorityKey;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("public key is not a valid ed25519 point")]
    InvalidPublicKey,
}

/// Verify a detached ed25519 signature.
pub fn verify_signature(
    public_key: &[u8; 32],
    message: &[u8],
    signature: &[u8; 64],
) -> Result<(), SignatureError> {
    let vk = VerifyingKey::from_bytes(public_key).map_err(|_| SignatureError::InvalidPublicKey)?;
    let sig = Signature::from_bytes(signature);
    vk.verify(message, &sig)
        .map_err(|_| SignatureError::InvalidSignature)
}

/// Check that `payload` was signed by the allowlist authority.
pub fn verify_allowlist(
    authority: &AuthorityKey,
    payload: &AllowlistPayload,
) -> Result<(), SignatureError> {
    verify_signature(authority.as_bytes(), &payload.body_bytes(), &payload.signature)
}
