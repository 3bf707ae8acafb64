//! APDU framing: command decoding, response encoding and host-side chunking.
//!
//! Commands are `CLA | INS | P1 | P2 | Lc | data`. Responses are
//! `data ‖ SW1 SW2`. Payloads that do not fit one command are split into an
//! init chunk followed by add chunks and a final last chunk (P1 = 0/1/2).

use crate::constants::{APDU_CHUNK_SIZE, APDU_HEADER_LEN, CLA};
use crate::error::LedgeracioError;

// ── StatusWord ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusWord {
    Ok,
    Busy,
    ExecutionError,
    WrongLength,
    DataInvalid,
    ConditionsNotSatisfied,
    CommandNotAllowed,
    InvalidP1P2,
    InsNotSupported,
    ClaNotSupported,
}

impl StatusWord {
    pub fn code(self) -> u16 {
        match self {
            StatusWord::Ok => 0x9000,
            StatusWord::Busy => 0x9001,
            StatusWord::ExecutionError => 0x6400,
            StatusWord::WrongLength => 0x6700,
            StatusWord::DataInvalid => 0x6984,
            StatusWord::ConditionsNotSatisfied => 0x6985,
            StatusWord::CommandNotAllowed => 0x6986,
            StatusWord::InvalidP1P2 => 0x6B00,
            StatusWord::InsNotSupported => 0x6D00,
            StatusWord::ClaNotSupported => 0x6E00,
        }
    }

    /// Human-readable text matching the host library's error strings.
    pub fn description(self) -> &'static str {
        match self {
            StatusWord::Ok => "No errors",
            StatusWord::Busy => "Device is busy",
            StatusWord::ExecutionError => "Execution Error",
            StatusWord::WrongLength => "Wrong Length",
            StatusWord::DataInvalid => "Data is invalid",
            StatusWord::ConditionsNotSatisfied => "Conditions not satisfied",
            StatusWord::CommandNotAllowed => "Transaction rejected",
            StatusWord::InvalidP1P2 => "Invalid P1/P2",
            StatusWord::InsNotSupported => "Instruction not supported",
            StatusWord::ClaNotSupported => "CLA not supported",
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApduCommand {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
}

impl ApduCommand {
    /// Decode a raw command buffer. `Lc` must match the data length exactly.
    pub fn parse(raw: &[u8]) -> Result<Self, LedgeracioError> {
        if raw.len() < APDU_HEADER_LEN {
            return Err(LedgeracioError::WrongLength {
                expected: APDU_HEADER_LEN,
                got: raw.len(),
            });
        }
        let lc = raw[4] as usize;
        let data = &raw[APDU_HEADER_LEN..];
        if data.len() != lc {
            return Err(LedgeracioError::WrongLength {
                expected: APDU_HEADER_LEN + lc,
                got: raw.len(),
            });
        }
        if raw[0] != CLA {
            return Err(LedgeracioError::UnsupportedClass(raw[0]));
        }
        Ok(Self {
            cla: raw[0],
            ins: raw[1],
            p1: raw[2],
            p2: raw[3],
            data: data.to_vec(),
        })
    }

    pub fn new(ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self { cla: CLA, ins, p1, p2, data }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(APDU_HEADER_LEN + self.data.len());
        out.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2, self.data.len() as u8]);
        out.extend_from_slice(&self.data);
        out
    }

    pub fn chunk_kind(&self) -> Result<ChunkKind, LedgeracioError> {
        ChunkKind::from_p1(self.p1)
    }
}

/// Position of a chunk within a multi-command payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkKind {
    Init,
    Add,
    Last,
}

impl ChunkKind {
    pub fn from_p1(p1: u8) -> Result<Self, LedgeracioError> {
        match p1 {
            0x00 => Ok(ChunkKind::Init),
            0x01 => Ok(ChunkKind::Add),
            0x02 => Ok(ChunkKind::Last),
            other => Err(LedgeracioError::InvalidChunkType(other)),
        }
    }

    pub fn p1(self) -> u8 {
        match self {
            ChunkKind::Init => 0x00,
            ChunkKind::Add => 0x01,
            ChunkKind::Last => 0x02,
        }
    }
}

/// Split `payload` into an init command carrying `init` followed by add/last
/// commands of at most [`APDU_CHUNK_SIZE`] bytes. An empty payload still
/// produces one (empty) last chunk.
pub fn chunk_command(ins: u8, init: &[u8], payload: &[u8]) -> Vec<ApduCommand> {
    let mut cmds = vec![ApduCommand::new(ins, ChunkKind::Init.p1(), 0, init.to_vec())];
    let pieces: Vec<&[u8]> = if payload.is_empty() {
        vec![&[][..]]
    } else {
        payload.chunks(APDU_CHUNK_SIZE).collect()
    };
    let last = pieces.len() - 1;
    for (i, piece) in pieces.into_iter().enumerate() {
        let kind = if i == last { ChunkKind::Last } else { ChunkKind::Add };
        cmds.push(ApduCommand::new(ins, kind.p1(), 0, piece.to_vec()));
    }
    cmds
}

// ── Responses ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApduResponse {
    pub data: Vec<u8>,
    pub status: StatusWord,
}

impl ApduResponse {
    pub fn ok(data: Vec<u8>) -> Self {
        Self { data, status: StatusWord::Ok }
    }

    pub fn status(status: StatusWord) -> Self {
        Self { data: Vec::new(), status }
    }

    pub fn from_error(err: &LedgeracioError) -> Self {
        Self {
            data: err.response_message().map(String::into_bytes).unwrap_or_default(),
            status: err.status_word(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusWord::Ok
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        out.extend_from_slice(&self.status.code().to_be_bytes());
        out
    }

    /// Error text as the host library presents it: the body for data-invalid
    /// responses that carry one, otherwise the status description.
    pub fn error_message(&self) -> String {
        if self.status == StatusWord::DataInvalid && !self.data.is_empty() {
            return String::from_utf8_lossy(&self.data).into_owned();
        }
        self.status.description().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::INS_ALLOWLIST_UPLOAD;

    #[test]
    fn parse_rejects_lc_mismatch() {
        let raw = [CLA, 0x00, 0x00, 0x00, 0x03, 0xAA];
        assert!(matches!(
            ApduCommand::parse(&raw),
            Err(LedgeracioError::WrongLength { .. })
        ));
    }

    #[test]
    fn parse_rejects_foreign_class() {
        let raw = [0xE0, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(
            ApduCommand::parse(&raw),
            Err(LedgeracioError::UnsupportedClass(0xE0))
        );
    }

    #[test]
    fn chunking_splits_on_chunk_size() {
        let payload = vec![7u8; APDU_CHUNK_SIZE * 2 + 10];
        let cmds = chunk_command(INS_ALLOWLIST_UPLOAD, &[], &payload);
        let kinds: Vec<_> = cmds.iter().map(|c| c.chunk_kind().unwrap()).collect();
        assert_eq!(
            kinds,
            vec![ChunkKind::Init, ChunkKind::Add, ChunkKind::Add, ChunkKind::Last]
        );
        assert_eq!(cmds[3].data.len(), 10);
        let rebuilt: Vec<u8> = cmds[1..].iter().flat_map(|c| c.data.clone()).collect();
        assert_eq!(rebuilt, payload);
    }

    #[test]
    fn empty_payload_still_ends_with_last_chunk() {
        let cmds = chunk_command(INS_ALLOWLIST_UPLOAD, &[], &[]);
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[1].chunk_kind().unwrap(), ChunkKind::Last);
    }

    #[test]
    fn response_appends_status_word() {
        let resp = ApduResponse::from_error(&LedgeracioError::TargetNotAllowed);
        let bytes = resp.to_bytes();
        assert_eq!(&bytes[bytes.len() - 2..], &[0x69, 0x84]);
        assert_eq!(resp.error_message(), "Not allowed");
        assert_eq!(
            ApduResponse::status(StatusWord::CommandNotAllowed).error_message(),
            "Transaction rejected"
        );
    }
}
