//! Nomination signing.
//!
//! The transaction is decoded and shown to the user first. The allowlist is
//! consulted only after the user approves, so a refused nomination has
//! always been reviewed before "Not allowed" is reported.

use ledgeracio_core::constants::SIG_TYPE_ED25519;
use ledgeracio_core::error::LedgeracioError;
use ledgeracio_core::nomination::{Era, NominationTx};
use ledgeracio_core::types::Bip32Path;
use ledgeracio_crypto::DeviceSigner;
use ledgeracio_store::AllowlistStore;
use tracing::{info, warn};

use crate::approval::ReviewStep;
use crate::gate::check_nomination_allowed;

/// Planck per DOT.
const DOT_DECIMALS: u32 = 10;

#[derive(Clone, Debug)]
pub struct PendingSign {
    pub path: Bip32Path,
    pub blob: Vec<u8>,
    pub tx: NominationTx,
}

/// Decode the path (init chunk) and the transaction blob.
pub fn prepare_sign(init: &[u8], blob: Vec<u8>) -> Result<PendingSign, LedgeracioError> {
    let path = Bip32Path::from_le_bytes(init)?;
    let tx = NominationTx::parse(&blob)?;
    Ok(PendingSign { path, blob, tx })
}

/// Enforce the allowlist and sign. Response body: sig type ‖ signature.
pub fn finish_sign<S: DeviceSigner>(
    store: &AllowlistStore,
    signer: &S,
    pending: PendingSign,
) -> Result<Vec<u8>, LedgeracioError> {
    if !check_nomination_allowed(store, &pending.tx.request()) {
        warn!(path = %pending.path, targets = pending.tx.targets.len(), "nomination refused");
        return Err(LedgeracioError::TargetNotAllowed);
    }
    let signature = signer.sign(&pending.path, &pending.blob);
    info!(path = %pending.path, targets = pending.tx.targets.len(), "nomination signed");

    let mut out = Vec::with_capacity(1 + signature.len());
    out.push(SIG_TYPE_ED25519);
    out.extend_from_slice(&signature);
    Ok(out)
}

pub fn review_steps(tx: &NominationTx, expert_mode: bool) -> Vec<ReviewStep> {
    let total = tx.targets.len();
    let mut steps = vec![ReviewStep::new("Staking", "Nominate")];
    for (i, target) in tx.targets.iter().enumerate() {
        steps.push(ReviewStep::new(format!("Target key [{}/{}]", i + 1, total), target.to_hex()));
    }
    if expert_mode {
        return steps;
    }

    let era = match tx.era {
        Era::Immortal => "immortal".to_string(),
        Era::Mortal { period, phase } => format!("{phase} / {period}"),
    };
    steps.extend([
        ReviewStep::new("Era", era),
        ReviewStep::new("Nonce", tx.nonce.to_string()),
        ReviewStep::new("Tip", format!("DOT {}", format_planck(tx.tip))),
        ReviewStep::new("Spec version", tx.spec_version.to_string()),
        ReviewStep::new("Tx version", tx.tx_version.to_string()),
        ReviewStep::new("Genesis hash", hex::encode(tx.genesis_hash)),
        ReviewStep::new("Block hash", hex::encode(tx.block_hash)),
    ]);
    steps
}

fn format_planck(amount: u128) -> String {
    let unit = 10u128.pow(DOT_DECIMALS);
    let whole = amount / unit;
    let frac = amount % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = DOT_DECIMALS as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
