use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    BIP32_HARDENED, BIP32_PATH_BYTES, BIP32_PATH_LEN, BIP44_PURPOSE, POLKADOT_COIN_TYPE,
    PUBLIC_KEY_LEN,
};
use crate::error::LedgeracioError;

/// Allowlist sequence number; strictly increasing across accepted uploads.
pub type AllowlistNonce = u32;

// ── AuthorityKey ─────────────────────────────────────────────────────────────

/// 32-byte ed25519 public key whose signature authorizes allowlist uploads.
///
/// Stored as raw bytes: the device does not check that the key is a valid
/// curve point when it is provisioned, only when an upload is verified.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorityKey(pub [u8; 32]);

impl AuthorityKey {
    /// Length-checked construction from an untrusted buffer.
    pub fn from_slice(data: &[u8]) -> Result<Self, LedgeracioError> {
        let arr: [u8; 32] = data.try_into().map_err(|_| LedgeracioError::WrongLength {
            expected: PUBLIC_KEY_LEN,
            got: data.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for AuthorityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorityKey({}…)", &self.to_hex()[..16])
    }
}

// ── Address ──────────────────────────────────────────────────────────────────

/// 32-byte validator account id. Used both as an allowlist entry and as a
/// nomination target.
///
/// Rendered as the raw public key in hex, the same form the authority tool
/// takes for allowlist entries. No network-prefixed address encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, LedgeracioError> {
        let bytes = hex::decode(s).map_err(|e| LedgeracioError::DataInvalid(e.to_string()))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            LedgeracioError::WrongLength {
                expected: PUBLIC_KEY_LEN,
                got: bytes.len(),
            }
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}…)", &self.to_hex()[..16])
    }
}

// ── ContentHash ──────────────────────────────────────────────────────────────

/// Digest of an allowlist body (nonce ‖ count ‖ entries), signature excluded.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}…)", &self.to_hex()[..16])
    }
}

// ── Bip32Path ────────────────────────────────────────────────────────────────

/// Five-component derivation path: 44' / 354' / account' / change / index.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Bip32Path(pub [u32; BIP32_PATH_LEN]);

impl Bip32Path {
    pub fn new(account: u32, change: u32, index: u32) -> Self {
        Self([
            BIP44_PURPOSE | BIP32_HARDENED,
            POLKADOT_COIN_TYPE | BIP32_HARDENED,
            account,
            change,
            index,
        ])
    }

    /// Decode and validate a path from its little-endian wire form.
    pub fn from_le_bytes(data: &[u8]) -> Result<Self, LedgeracioError> {
        if data.len() != BIP32_PATH_BYTES {
            return Err(LedgeracioError::WrongLength {
                expected: BIP32_PATH_BYTES,
                got: data.len(),
            });
        }
        let mut components = [0u32; BIP32_PATH_LEN];
        for (c, bytes) in components.iter_mut().zip(data.chunks_exact(4)) {
            *c = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        let path = Self(components);
        path.validate()?;
        Ok(path)
    }

    pub fn to_le_bytes(&self) -> [u8; BIP32_PATH_BYTES] {
        let mut out = [0u8; BIP32_PATH_BYTES];
        for (dst, c) in out.chunks_exact_mut(4).zip(self.0.iter()) {
            dst.copy_from_slice(&c.to_le_bytes());
        }
        out
    }

    fn validate(&self) -> Result<(), LedgeracioError> {
        let [purpose, coin, account, _, _] = self.0;
        if purpose != BIP44_PURPOSE | BIP32_HARDENED
            || coin != POLKADOT_COIN_TYPE | BIP32_HARDENED
            || account & BIP32_HARDENED == 0
        {
            return Err(LedgeracioError::InvalidPath);
        }
        Ok(())
    }
}

impl fmt::Display for Bip32Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for c in self.0 {
            if c & BIP32_HARDENED != 0 {
                write!(f, "/{}'", c & !BIP32_HARDENED)?;
            } else {
                write!(f, "/{}", c)?;
            }
        }
        Ok(())
    }
}
