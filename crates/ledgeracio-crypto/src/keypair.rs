use ed25519_dalek::{Signer, SigningKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use ledgeracio_core::allowlist::AllowlistPayload;
use ledgeracio_core::types::{Address, AllowlistNonce, AuthorityKey};

/// Host-side allowlist authority: the ed25519 key that signs uploads.
///
/// Only the 32-byte seed is serialized; the public key is re-derived on load.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "KeyFile", into = "KeyFile")]
pub struct AuthorityKeyPair {
    signing_key: SigningKey,
}

impl AuthorityKeyPair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self { signing_key: SigningKey::generate(&mut rand::rngs::OsRng) }
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { signing_key: SigningKey::from_bytes(&seed) }
    }

    pub fn authority_key(&self) -> AuthorityKey {
        AuthorityKey(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Build and sign an allowlist payload.
    pub fn sign_allowlist(&self, nonce: AllowlistNonce, entries: Vec<Address>) -> AllowlistPayload {
        let mut payload = AllowlistPayload { nonce, entries, signature: [0u8; 64] };
        payload.signature = self.sign(&payload.body_bytes());
        payload
    }
}

impl std::fmt::Debug for AuthorityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthorityKeyPair {{ public_key: {:?} }}", self.authority_key())
    }
}

// ── Keyfile form ─────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct KeyFile {
    public_key: String,
    seed: String,
}

impl From<AuthorityKeyPair> for KeyFile {
    fn from(kp: AuthorityKeyPair) -> Self {
        let seed = Zeroizing::new(kp.signing_key.to_bytes());
        Self {
            public_key: kp.authority_key().to_hex(),
            seed: hex::encode(*seed),
        }
    }
}

impl TryFrom<KeyFile> for AuthorityKeyPair {
    type Error = String;

    fn try_from(file: KeyFile) -> Result<Self, Self::Error> {
        let bytes = Zeroizing::new(hex::decode(&file.seed).map_err(|e| e.to_string())?);
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| format!("seed must be 32 bytes, got {}", bytes.len()))?;
        let kp = Self::from_seed(seed);
        if kp.authority_key().to_hex() != file.public_key.to_lowercase() {
            return Err("public key does not match seed".into());
        }
        Ok(kp)
    }
}
