pub mod constants;
pub mod error;
pub mod types;
pub mod apdu;
pub mod allowlist;
pub mod nomination;

pub use constants::*;
pub use error::LedgeracioError;
pub use types::*;
pub use apdu::{ApduCommand, ApduResponse, ChunkKind, StatusWord};
pub use allowlist::{AllowlistPayload, CommittedAllowlist};
pub use nomination::{Era, NominationRequest, NominationTx};
