use ledgeracio_core::allowlist::body_bytes;
use ledgeracio_core::types::{Address, AllowlistNonce, ContentHash};

/// Compute BLAKE3 hash of arbitrary bytes → 32-byte array.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Content hash committed by the device: BLAKE3(nonce ‖ count ‖ entries).
pub fn content_hash(nonce: AllowlistNonce, entries: &[Address]) -> ContentHash {
    ContentHash(blake3_hash(&body_bytes(nonce, entries)))
}
