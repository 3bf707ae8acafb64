use thiserror::Error;

use crate::apdu::StatusWord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgeracioError {
    // ── Authorization ────────────────────────────────────────────────────────
    #[error("allowlist authority key already set")]
    AuthorityKeyAlreadySet,

    #[error("allowlist authority key not set")]
    AuthorityKeyMissing,

    #[error("no allowlist committed")]
    AllowlistMissing,

    #[error("allowlist signature does not verify under the authority key")]
    InvalidSignature,

    #[error("nomination target not in allowlist")]
    TargetNotAllowed,

    // ── Content conflicts ────────────────────────────────────────────────────
    #[error("stale allowlist nonce: committed {committed}, got {got}")]
    StaleNonce { committed: u32, got: u32 },

    #[error("chunk received without an init chunk")]
    MissingInitChunk,

    // ── User interaction ─────────────────────────────────────────────────────
    #[error("rejected by user")]
    UserRejected,

    #[error("device busy: a review is in progress")]
    Busy,

    // ── Malformed input ──────────────────────────────────────────────────────
    #[error("wrong length: expected {expected}, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("buffer overflow: capacity {max} bytes")]
    BufferOverflow { max: usize },

    #[error("allowlist has {got} entries, maximum is {max}")]
    TooManyEntries { max: u32, got: u32 },

    #[error("unsupported class byte 0x{0:02x}")]
    UnsupportedClass(u8),

    #[error("unsupported instruction 0x{0:02x}")]
    UnsupportedInstruction(u8),

    #[error("invalid chunk type 0x{0:02x}")]
    InvalidChunkType(u8),

    #[error("invalid derivation path")]
    InvalidPath,

    #[error("{0}")]
    DataInvalid(String),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgeracioError {
    /// Status word reported to the host for this failure.
    pub fn status_word(&self) -> StatusWord {
        use LedgeracioError::*;
        match self {
            AuthorityKeyAlreadySet | AuthorityKeyMissing | AllowlistMissing | InvalidSignature => {
                StatusWord::CommandNotAllowed
            }
            TargetNotAllowed => StatusWord::DataInvalid,
            StaleNonce { .. } | MissingInitChunk => StatusWord::ExecutionError,
            UserRejected => StatusWord::ConditionsNotSatisfied,
            Busy => StatusWord::Busy,
            WrongLength { .. } => StatusWord::WrongLength,
            BufferOverflow { .. } | TooManyEntries { .. } | InvalidPath | DataInvalid(_) => {
                StatusWord::DataInvalid
            }
            UnsupportedClass(_) => StatusWord::ClaNotSupported,
            UnsupportedInstruction(_) => StatusWord::InsNotSupported,
            InvalidChunkType(_) => StatusWord::InvalidP1P2,
            Serialization(_) | Storage(_) => StatusWord::ExecutionError,
        }
    }

    /// Error text carried in the response body, if any.
    ///
    /// Data-invalid failures explain themselves to the host; everything else
    /// is identified by its status word alone.
    pub fn response_message(&self) -> Option<String> {
        match self {
            LedgeracioError::TargetNotAllowed => Some("Not allowed".into()),
            LedgeracioError::BufferOverflow { .. }
            | LedgeracioError::TooManyEntries { .. }
            | LedgeracioError::InvalidPath
            | LedgeracioError::DataInvalid(_) => Some(self.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_failures_share_command_not_allowed() {
        for e in [
            LedgeracioError::AuthorityKeyAlreadySet,
            LedgeracioError::AuthorityKeyMissing,
            LedgeracioError::AllowlistMissing,
            LedgeracioError::InvalidSignature,
        ] {
            assert_eq!(e.status_word().code(), 0x6986);
            assert!(e.response_message().is_none());
        }
    }

    #[test]
    fn target_not_allowed_reports_message() {
        let e = LedgeracioError::TargetNotAllowed;
        assert_eq!(e.status_word().code(), 0x6984);
        assert_eq!(e.response_message().as_deref(), Some("Not allowed"));
    }

    #[test]
    fn stale_nonce_is_execution_error() {
        let e = LedgeracioError::StaleNonce { committed: 10, got: 10 };
        assert_eq!(e.status_word().code(), 0x6400);
    }

    #[test]
    fn user_rejection_is_distinct_from_not_allowed() {
        assert_ne!(
            LedgeracioError::UserRejected.status_word(),
            LedgeracioError::AuthorityKeyMissing.status_word()
        );
    }
}
