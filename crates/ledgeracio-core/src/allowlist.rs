use serde::{Deserialize, Serialize};

use crate::constants::{ALLOWLIST_ENTRY_LEN, ALLOWLIST_HEADER_LEN, SIGNATURE_LEN};
use crate::error::LedgeracioError;
use crate::types::{Address, AllowlistNonce, ContentHash};

// ── AllowlistPayload ─────────────────────────────────────────────────────────

/// A signed allowlist as uploaded by the host.
///
/// Wire layout (integers little-endian):
///
/// ```text
/// nonce:u32 | count:u32 | count × address:32 | signature:64
/// ```
///
/// The signature covers everything before it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowlistPayload {
    pub nonce: AllowlistNonce,
    pub entries: Vec<Address>,
    pub signature: [u8; SIGNATURE_LEN],
}

impl AllowlistPayload {
    /// Total wire length for an allowlist of `count` entries.
    pub fn expected_len(count: u32) -> usize {
        ALLOWLIST_HEADER_LEN + ALLOWLIST_ENTRY_LEN * count as usize + SIGNATURE_LEN
    }

    /// Decode and length-check an uploaded buffer.
    ///
    /// The whole buffer is validated against the declared count before any
    /// entry is read; `max_entries` bounds the count the device will accept.
    pub fn decode(data: &[u8], max_entries: u32) -> Result<Self, LedgeracioError> {
        let min = Self::expected_len(0);
        if data.len() < min {
            return Err(LedgeracioError::WrongLength { expected: min, got: data.len() });
        }
        let nonce = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let count = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        if count > max_entries {
            return Err(LedgeracioError::TooManyEntries { max: max_entries, got: count });
        }
        let expected = Self::expected_len(count);
        if data.len() != expected {
            return Err(LedgeracioError::WrongLength { expected, got: data.len() });
        }

        let body_end = expected - SIGNATURE_LEN;
        let entries = data[ALLOWLIST_HEADER_LEN..body_end]
            .chunks_exact(ALLOWLIST_ENTRY_LEN)
            .map(|chunk| {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(chunk);
                Address(arr)
            })
            .collect();
        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&data[body_end..]);

        Ok(Self { nonce, entries, signature })
    }

    /// The signed (and hashed) portion: nonce ‖ count ‖ entries.
    pub fn body_bytes(&self) -> Vec<u8> {
        body_bytes(self.nonce, &self.entries)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.body_bytes();
        out.extend_from_slice(&self.signature);
        out
    }

    pub fn count(&self) -> u32 {
        self.entries.len() as u32
    }
}

/// Encode the signed portion of an allowlist.
pub fn body_bytes(nonce: AllowlistNonce, entries: &[Address]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ALLOWLIST_HEADER_LEN + ALLOWLIST_ENTRY_LEN * entries.len());
    out.extend_from_slice(&nonce.to_le_bytes());
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for entry in entries {
        out.extend_from_slice(entry.as_bytes());
    }
    out
}

// ── CommittedAllowlist ───────────────────────────────────────────────────────

/// The allowlist the device currently enforces.
///
/// Persisted as one record, so readers see either the previous commit or the
/// new one, never a mixture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedAllowlist {
    pub nonce: AllowlistNonce,
    pub hash: ContentHash,
    pub entries: Vec<Address>,
}

impl CommittedAllowlist {
    pub fn contains(&self, address: &Address) -> bool {
        self.entries.iter().any(|e| e == address)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgeracioError> {
        bincode::serialize(self).map_err(|e| LedgeracioError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgeracioError> {
        bincode::deserialize(bytes).map_err(|e| LedgeracioError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(nonce: u32, n: u8) -> AllowlistPayload {
        AllowlistPayload {
            nonce,
            entries: (0..n).map(|i| Address([i; 32])).collect(),
            signature: [0xAB; SIGNATURE_LEN],
        }
    }

    #[test]
    fn empty_allowlist_is_72_bytes() {
        let p = payload(0, 0);
        assert_eq!(p.to_bytes().len(), 72);
        assert_eq!(AllowlistPayload::expected_len(0), 8 + 64);
    }

    #[test]
    fn decode_reads_fields_in_order() {
        let p = payload(10, 3);
        let decoded = AllowlistPayload::decode(&p.to_bytes(), 16).unwrap();
        assert_eq!(decoded.nonce, 10);
        assert_eq!(decoded.entries[2], Address([2; 32]));
        assert_eq!(decoded.signature, [0xAB; SIGNATURE_LEN]);
    }

    #[test]
    fn decode_rejects_count_mismatch() {
        let mut bytes = payload(1, 2).to_bytes();
        bytes[4] = 3; // claims one more entry than present
        assert!(matches!(
            AllowlistPayload::decode(&bytes, 16),
            Err(LedgeracioError::WrongLength { expected: 168, got: 136 })
        ));
    }

    #[test]
    fn decode_rejects_truncated_header() {
        assert!(AllowlistPayload::decode(&[0u8; 20], 16).is_err());
    }

    #[test]
    fn decode_enforces_entry_cap() {
        let bytes = payload(1, 5).to_bytes();
        assert_eq!(
            AllowlistPayload::decode(&bytes, 4),
            Err(LedgeracioError::TooManyEntries { max: 4, got: 5 })
        );
    }

    #[test]
    fn body_excludes_signature() {
        let p = payload(7, 1);
        let body = p.body_bytes();
        assert_eq!(body.len(), 8 + 32);
        assert_eq!(&body[..4], &7u32.to_le_bytes());
    }

    #[test]
    fn committed_record_survives_bincode() {
        let c = CommittedAllowlist {
            nonce: 3,
            hash: ContentHash([9; 32]),
            entries: vec![Address([1; 32])],
        };
        let restored = CommittedAllowlist::from_bytes(&c.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, c);
        assert!(restored.contains(&Address([1; 32])));
        assert!(!restored.contains(&Address([2; 32])));
    }
}
