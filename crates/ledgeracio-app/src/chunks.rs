use ledgeracio_core::apdu::ChunkKind;
use ledgeracio_core::error::LedgeracioError;

/// Accumulates a chunked payload (init, add…, last).
///
/// The init chunk's data is kept apart from the payload so instructions can
/// carry a header there (the sign instruction sends its derivation path).
#[derive(Debug)]
pub struct ChunkBuffer {
    capacity: usize,
    init: Option<Vec<u8>>,
    data: Vec<u8>,
}

impl ChunkBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, init: None, data: Vec::new() }
    }

    /// Feed one chunk. Returns `(init, payload)` when the last chunk lands.
    pub fn push(
        &mut self,
        kind: ChunkKind,
        chunk: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, LedgeracioError> {
        if kind == ChunkKind::Init {
            self.reset();
            self.init = Some(chunk.to_vec());
            return Ok(None);
        }
        if self.init.is_none() {
            return Err(LedgeracioError::MissingInitChunk);
        }
        if self.data.len() + chunk.len() > self.capacity {
            self.reset();
            return Err(LedgeracioError::BufferOverflow { max: self.capacity });
        }
        self.data.extend_from_slice(chunk);
        if kind == ChunkKind::Last {
            let init = self.init.take().unwrap_or_default();
            let data = std::mem::take(&mut self.data);
            return Ok(Some((init, data)));
        }
        Ok(None)
    }

    pub fn reset(&mut self) {
        self.init = None;
        self.data.clear();
    }
}
