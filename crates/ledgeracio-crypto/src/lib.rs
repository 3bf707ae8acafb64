pub mod device;
pub mod ed25519;
pub mod hash;
pub mod keypair;

pub use device::{DeviceSigner, SeedSigner};
pub use ed25519::{verify_allowlist, SignatureError};
pub use hash::{blake3_hash, content_hash};
pub use keypair::AuthorityKeyPair;
