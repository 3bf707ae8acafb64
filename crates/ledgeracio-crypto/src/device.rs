use ed25519_dalek::{Signer, SigningKey};
use zeroize::Zeroizing;

use ledgeracio_core::constants::DEVICE_KEY_CONTEXT;
use ledgeracio_core::types::Bip32Path;

/// Source of the device's transaction-signing keys.
///
/// The sign flow only needs "sign these bytes with the key at this path";
/// how keys are derived and guarded is up to the implementation.
pub trait DeviceSigner {
    fn public_key(&self, path: &Bip32Path) -> [u8; 32];
    fn sign(&self, path: &Bip32Path, message: &[u8]) -> [u8; 64];
}

/// Derives one ed25519 key per path from a 32-byte device seed using
/// BLAKE3 key derivation. Not compatible with BIP32-Ed25519 wallets.
pub struct SeedSigner {
    seed: Zeroizing<[u8; 32]>,
}

impl SeedSigner {
    pub fn new(seed: [u8; 32]) -> Self {
        Self { seed: Zeroizing::new(seed) }
    }

    fn key_for(&self, path: &Bip32Path) -> SigningKey {
        let mut material = Zeroizing::new(Vec::with_capacity(32 + 20));
        material.extend_from_slice(&*self.seed);
        material.extend_from_slice(&path.to_le_bytes());
        let derived = Zeroizing::new(blake3::derive_key(DEVICE_KEY_CONTEXT, &material));
        SigningKey::from_bytes(&derived)
    }
}

impl DeviceSigner for SeedSigner {
    fn public_key(&self, path: &Bip32Path) -> [u8; 32] {
        self.key_for(path).verifying_key().to_bytes()
    }

    fn sign(&self, path: &Bip32Path, message: &[u8]) -> [u8; 64] {
        self.key_for(path).sign(message).to_bytes()
    }
}

impl std::fmt::Debug for SeedSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SeedSigner {{ .. }}")
    }
}
