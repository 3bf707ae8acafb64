/// ─── Ledgeracio Protocol Constants ──────────────────────────────────────────
///
/// Wire-level constants shared by the device application, the simulator and
/// the host-side authority tool.

// ── APDU class / instructions ────────────────────────────────────────────────

/// APDU class byte for the Polkadot application family.
pub const CLA: u8 = 0x99;

pub const INS_GET_VERSION: u8 = 0x00;
pub const INS_SIGN: u8 = 0x02;
pub const INS_ALLOWLIST_GET_PUBKEY: u8 = 0x90;
pub const INS_ALLOWLIST_SET_PUBKEY: u8 = 0x91;
pub const INS_ALLOWLIST_GET_HASH: u8 = 0x92;
pub const INS_ALLOWLIST_UPLOAD: u8 = 0x93;

/// Header length: CLA, INS, P1, P2, Lc.
pub const APDU_HEADER_LEN: usize = 5;

/// Maximum data bytes carried by a single chunk.
pub const APDU_CHUNK_SIZE: usize = 250;

// ── Keys / signatures ────────────────────────────────────────────────────────

pub const PUBLIC_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;
pub const CONTENT_HASH_LEN: usize = 32;

/// Signature type prefix returned by the sign instruction (0 = ed25519).
pub const SIG_TYPE_ED25519: u8 = 0x00;

// ── Allowlist payload ────────────────────────────────────────────────────────

/// nonce:u32 ‖ count:u32
pub const ALLOWLIST_HEADER_LEN: usize = 8;

/// Each allowlisted validator address is a raw 32-byte account id.
pub const ALLOWLIST_ENTRY_LEN: usize = 32;

/// Default upper bound on entries accepted in a single upload.
pub const DEFAULT_MAX_ALLOWLIST_ENTRIES: u32 = 128;

// ── Transaction signing ──────────────────────────────────────────────────────

/// Derivation path: five little-endian u32 components.
pub const BIP32_PATH_LEN: usize = 5;
pub const BIP32_PATH_BYTES: usize = BIP32_PATH_LEN * 4;
pub const BIP32_HARDENED: u32 = 0x8000_0000;
pub const BIP44_PURPOSE: u32 = 44;

/// SLIP-0044 coin type for Polkadot.
pub const POLKADOT_COIN_TYPE: u32 = 354;

/// Upper bound on a buffered transaction blob.
pub const MAX_TX_LEN: usize = 2048;

/// Pallet/call index of `staking.nominate` on the Polkadot runtime.
pub const STAKING_PALLET_INDEX: u8 = 0x07;
pub const NOMINATE_CALL_INDEX: u8 = 0x05;

/// Runtime cap on nomination targets.
pub const MAX_NOMINATIONS: usize = 16;

// ── Device ───────────────────────────────────────────────────────────────────

/// Target id reported by the version instruction (Nano S).
pub const DEFAULT_TARGET_ID: u32 = 0x3110_0004;

/// Context string for deriving per-path device signing keys.
pub const DEVICE_KEY_CONTEXT: &str = "ledgeracio device key v1";
