use std::path::Path;

use ledgeracio_core::allowlist::CommittedAllowlist;
use ledgeracio_core::error::LedgeracioError;
use ledgeracio_core::types::AuthorityKey;
use tracing::debug;

const AUTHORITY_KEY: &[u8] = b"authority_key";
const COMMITTED: &[u8] = b"committed";

/// Persistent allowlist state backed by sled.
///
/// One named tree, `allowlist`, holding:
///   authority_key: raw 32-byte ed25519 public key (write-once)
///   committed:     bincode(CommittedAllowlist)
///
/// Every mutation is a single-key write, so a reader observes either the
/// old value or the new one.
pub struct AllowlistStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl AllowlistStore {
    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgeracioError> {
        let db = sled::open(path).map_err(storage)?;
        Self::from_db(db)
    }

    /// In-memory store discarded on drop.
    pub fn temporary() -> Result<Self, LedgeracioError> {
        let db = sled::Config::new().temporary(true).open().map_err(storage)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, LedgeracioError> {
        let tree = db.open_tree("allowlist").map_err(storage)?;
        Ok(Self { db, tree })
    }

    // ── Authority key ────────────────────────────────────────────────────────

    pub fn authority_key(&self) -> Result<Option<AuthorityKey>, LedgeracioError> {
        match self.tree.get(AUTHORITY_KEY).map_err(storage)? {
            Some(bytes) => Ok(Some(AuthorityKey::from_slice(&bytes).map_err(|_| {
                LedgeracioError::Storage("corrupt authority key record".into())
            })?)),
            None => Ok(None),
        }
    }

    /// Store the authority key if none is present.
    ///
    /// Fails with `AuthorityKeyAlreadySet` when a key exists; the stored key
    /// is never replaced.
    pub fn set_authority_key(&self, key: &AuthorityKey) -> Result<(), LedgeracioError> {
        let swapped = self
            .tree
            .compare_and_swap(AUTHORITY_KEY, None as Option<&[u8]>, Some(&key.as_bytes()[..]))
            .map_err(storage)?;
        if swapped.is_err() {
            return Err(LedgeracioError::AuthorityKeyAlreadySet);
        }
        self.flush()?;
        debug!(key = %key.to_hex(), "authority key persisted");
        Ok(())
    }

    // ── Committed allowlist ──────────────────────────────────────────────────

    pub fn committed_allowlist(&self) -> Result<Option<CommittedAllowlist>, LedgeracioError> {
        match self.tree.get(COMMITTED).map_err(storage)? {
            Some(bytes) => Ok(Some(CommittedAllowlist::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Replace the committed allowlist in one write.
    pub fn commit_allowlist(&self, allowlist: &CommittedAllowlist) -> Result<(), LedgeracioError> {
        let bytes = allowlist.to_bytes()?;
        self.tree.insert(COMMITTED, bytes).map_err(storage)?;
        self.flush()?;
        debug!(nonce = allowlist.nonce, hash = %allowlist.hash, "allowlist persisted");
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), LedgeracioError> {
        self.db.flush().map_err(storage)?;
        Ok(())
    }
}

fn storage(e: sled::Error) -> LedgeracioError {
    LedgeracioError::Storage(e.to_string())
}
