//! Decoder for `staking.nominate` signing payloads.
//!
//! Only the nomination call is understood; every other call is refused. All
//! reads go through [`Reader`], which fails on the first out-of-bounds access
//! instead of trusting embedded lengths.

use crate::constants::{MAX_NOMINATIONS, NOMINATE_CALL_INDEX, STAKING_PALLET_INDEX};
use crate::error::LedgeracioError;
use crate::types::Address;

/// Target list extracted from a nomination; lives for one sign operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NominationRequest {
    pub targets: Vec<Address>,
}

/// Transaction mortality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Era {
    Immortal,
    Mortal { period: u64, phase: u64 },
}

/// A decoded nomination signing payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NominationTx {
    pub targets: Vec<Address>,
    pub era: Era,
    pub nonce: u64,
    pub tip: u128,
    pub spec_version: u32,
    pub tx_version: u32,
    pub genesis_hash: [u8; 32],
    pub block_hash: [u8; 32],
}

impl NominationTx {
    pub fn parse(blob: &[u8]) -> Result<Self, LedgeracioError> {
        let mut r = Reader::new(blob);

        let pallet = r.u8()?;
        let call = r.u8()?;
        if pallet != STAKING_PALLET_INDEX || call != NOMINATE_CALL_INDEX {
            return Err(LedgeracioError::DataInvalid("Method not supported".into()));
        }

        let count = usize::try_from(r.compact()?)
            .map_err(|_| LedgeracioError::DataInvalid("Too many targets".into()))?;
        if count == 0 || count > MAX_NOMINATIONS {
            return Err(LedgeracioError::DataInvalid(format!(
                "Nomination must name 1 to {MAX_NOMINATIONS} targets"
            )));
        }
        let mut targets = Vec::with_capacity(count);
        for _ in 0..count {
            targets.push(Address(r.array32()?));
        }

        let era = r.era()?;
        let nonce = u64::try_from(r.compact()?)
            .map_err(|_| LedgeracioError::DataInvalid("Nonce out of range".into()))?;
        let tip = r.compact()?;
        let spec_version = r.u32_le()?;
        let tx_version = r.u32_le()?;
        let genesis_hash = r.array32()?;
        let block_hash = r.array32()?;

        if !r.is_empty() {
            return Err(LedgeracioError::DataInvalid("Unexpected trailing bytes".into()));
        }

        Ok(Self {
            targets,
            era,
            nonce,
            tip,
            spec_version,
            tx_version,
            genesis_hash,
            block_hash,
        })
    }

    pub fn request(&self) -> NominationRequest {
        NominationRequest { targets: self.targets.clone() }
    }
}

// ── Reader ────────────────────────────────────────────────────────────────────

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], LedgeracioError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| LedgeracioError::DataInvalid("Unexpected end of buffer".into()))?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, LedgeracioError> {
        Ok(self.take(1)?[0])
    }

    fn u32_le(&mut self) -> Result<u32, LedgeracioError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn array32(&mut self) -> Result<[u8; 32], LedgeracioError> {
        let mut arr = [0u8; 32];
        arr.copy_from_slice(self.take(32)?);
        Ok(arr)
    }

    /// SCALE compact integer, up to u128.
    fn compact(&mut self) -> Result<u128, LedgeracioError> {
        let first = self.u8()?;
        match first & 0b11 {
            0b00 => Ok((first >> 2) as u128),
            0b01 => {
                let second = self.u8()?;
                Ok((u16::from_le_bytes([first, second]) >> 2) as u128)
            }
            0b10 => {
                let rest = self.take(3)?;
                Ok((u32::from_le_bytes([first, rest[0], rest[1], rest[2]]) >> 2) as u128)
            }
            _ => {
                let len = (first >> 2) as usize + 4;
                if len > 16 {
                    return Err(LedgeracioError::DataInvalid("Compact value too large".into()));
                }
                let mut le = [0u8; 16];
                le[..len].copy_from_slice(self.take(len)?);
                Ok(u128::from_le_bytes(le))
            }
        }
    }

    fn era(&mut self) -> Result<Era, LedgeracioError> {
        let first = self.u8()?;
        if first == 0 {
            return Ok(Era::Immortal);
        }
        let encoded = u16::from_le_bytes([first, self.u8()?]) as u64;
        let period = 2u64 << (encoded % (1 << 4));
        let quantize_factor = (period >> 12).max(1);
        let phase = (encoded >> 4) * quantize_factor;
        if period < 4 || phase >= period {
            return Err(LedgeracioError::DataInvalid("Invalid era".into()));
        }
        Ok(Era::Mortal { period, phase })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two-target nomination captured from the device test-suite.
    const NOMINATE_TWO: &str = "070508c60eb01cb98c5a12fc0815893afbf503fe8238a4791a70bfebe27ce8f311990a3cb5b2d4b3e29462cc84aae02345e654bb7999a60d2559b8f8d3935e5f465dafd50391010b63ce64c10c05120000000400000091b171bb158e2d3848fa23a9f1c25182fb8e20313b2c1eb49219da7a70ce90c391b171bb158e2d3848fa23a9f1c25182fb8e20313b2c1eb49219da7a70ce90c3";

    fn blob() -> Vec<u8> {
        hex::decode(NOMINATE_TWO).unwrap()
    }

    #[test]
    fn decodes_two_target_nomination() {
        let tx = NominationTx::parse(&blob()).unwrap();
        assert_eq!(tx.targets.len(), 2);
        assert_eq!(
            tx.targets[0].to_hex(),
            "c60eb01cb98c5a12fc0815893afbf503fe8238a4791a70bfebe27ce8f311990a"
        );
        assert_eq!(tx.era, Era::Mortal { period: 64, phase: 61 });
        assert_eq!(tx.nonce, 100);
        assert_eq!(tx.tip, 0x050c_c164_ce63);
        assert_eq!(tx.spec_version, 18);
        assert_eq!(tx.tx_version, 4);
        assert_eq!(tx.genesis_hash, tx.block_hash);
    }

    #[test]
    fn rejects_other_calls() {
        let mut b = blob();
        b[1] = 0x06; // staking.chill
        assert_eq!(
            NominationTx::parse(&b),
            Err(LedgeracioError::DataInvalid("Method not supported".into()))
        );
    }

    #[test]
    fn rejects_truncated_blob() {
        let b = blob();
        assert!(NominationTx::parse(&b[..b.len() - 1]).is_err());
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut b = blob();
        b.push(0);
        assert!(NominationTx::parse(&b).is_err());
    }

    #[test]
    fn rejects_empty_target_list() {
        assert!(NominationTx::parse(&[0x07, 0x05, 0x00]).is_err());
    }

    #[test]
    fn compact_modes() {
        assert_eq!(Reader::new(&[0x08]).compact().unwrap(), 2);
        assert_eq!(Reader::new(&[0x91, 0x01]).compact().unwrap(), 100);
        assert_eq!(Reader::new(&[0x02, 0x00, 0x01, 0x00]).compact().unwrap(), 16384);
        assert_eq!(
            Reader::new(&[0x03, 0x00, 0x00, 0x00, 0x40]).compact().unwrap(),
            1 << 30
        );
    }
}
