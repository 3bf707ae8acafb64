//! Command dispatcher: APDUs in, responses out.
//!
//! Single-threaded. A command either completes immediately or suspends on
//! user review; while suspended every further command is answered `Busy`
//! and the pending response is produced by [`LedgeracioApp::handle_ui`].

use ledgeracio_core::apdu::{ApduCommand, ApduResponse};
use ledgeracio_core::constants::{
    INS_ALLOWLIST_GET_HASH, INS_ALLOWLIST_GET_PUBKEY, INS_ALLOWLIST_SET_PUBKEY,
    INS_ALLOWLIST_UPLOAD, INS_GET_VERSION, INS_SIGN, MAX_TX_LEN,
};
use ledgeracio_core::allowlist::AllowlistPayload;
use ledgeracio_core::error::LedgeracioError;
use ledgeracio_core::types::AuthorityKey;
use ledgeracio_crypto::DeviceSigner;
use ledgeracio_store::AllowlistStore;
use tracing::{debug, info, warn};

use crate::approval::{ApprovalStateMachine, Decision, ReviewStep, Screen, UiEvent};
use crate::chunks::ChunkBuffer;
use crate::config::AppConfig;
use crate::sign::PendingSign;
use crate::upload::VerifiedUpload;
use crate::{authority, sign, upload};

/// Result of handing the app one command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Respond(ApduResponse),
    /// Review started; the response follows a UI decision.
    Pending,
}

/// Operation parked behind the approval state machine.
#[derive(Debug)]
enum PendingOp {
    SetAuthorityKey(AuthorityKey),
    Upload(VerifiedUpload),
    Sign(PendingSign),
}

pub struct LedgeracioApp<S: DeviceSigner> {
    store: AllowlistStore,
    signer: S,
    config: AppConfig,
    approval: ApprovalStateMachine,
    pending: Option<PendingOp>,
    upload_chunks: ChunkBuffer,
    sign_chunks: ChunkBuffer,
}

impl<S: DeviceSigner> LedgeracioApp<S> {
    pub fn new(store: AllowlistStore, signer: S, config: AppConfig) -> Self {
        let upload_capacity = AllowlistPayload::expected_len(config.max_allowlist_entries);
        Self {
            store,
            signer,
            approval: ApprovalStateMachine::new(),
            pending: None,
            upload_chunks: ChunkBuffer::new(upload_capacity),
            sign_chunks: ChunkBuffer::new(MAX_TX_LEN),
            config,
        }
    }

    pub fn store(&self) -> &AllowlistStore {
        &self.store
    }

    pub fn set_expert_mode(&mut self, enabled: bool) {
        info!(enabled, "expert mode");
        self.config.expert_mode = enabled;
    }

    /// Current review page, if a review is in progress.
    pub fn screen(&self) -> Option<Screen> {
        self.approval.screen()
    }

    pub fn is_reviewing(&self) -> bool {
        !self.approval.is_idle()
    }

    /// Process one raw command.
    pub fn handle_apdu(&mut self, raw: &[u8]) -> Reply {
        if self.is_reviewing() {
            debug!("command received during review");
            return Reply::Respond(ApduResponse::from_error(&LedgeracioError::Busy));
        }
        match self.dispatch(raw) {
            Ok(reply) => reply,
            Err(e) => {
                debug!(error = %e, status = ?e.status_word(), "command failed");
                Reply::Respond(ApduResponse::from_error(&e))
            }
        }
    }

    /// Feed one UI input. Returns the suspended command's response once the
    /// review ends.
    pub fn handle_ui(&mut self, event: UiEvent) -> Option<ApduResponse> {
        let decision = self.approval.handle(event)?;
        let op = self.pending.take()?;
        let result = match decision {
            Decision::Accepted => self.execute(op),
            Decision::Rejected => {
                info!(?event, "operation rejected by user");
                Err(LedgeracioError::UserRejected)
            }
        };
        Some(match result {
            Ok(data) => ApduResponse::ok(data),
            Err(e) => ApduResponse::from_error(&e),
        })
    }

    fn dispatch(&mut self, raw: &[u8]) -> Result<Reply, LedgeracioError> {
        let cmd = ApduCommand::parse(raw)?;
        match cmd.ins {
            INS_GET_VERSION => Ok(respond(self.version())),
            INS_ALLOWLIST_GET_PUBKEY => {
                let key = authority::get_authority_key(&self.store)?;
                Ok(respond(key.as_bytes().to_vec()))
            }
            INS_ALLOWLIST_SET_PUBKEY => {
                let key = authority::precheck_set(&self.store, &cmd.data)?;
                self.suspend(authority::review_steps(&key), PendingOp::SetAuthorityKey(key))
            }
            INS_ALLOWLIST_GET_HASH => {
                let hash = upload::get_allowlist_hash(&self.store)?;
                Ok(respond(hash.as_bytes().to_vec()))
            }
            INS_ALLOWLIST_UPLOAD => {
                let Some((_, data)) = self.upload_chunks.push(cmd.chunk_kind()?, &cmd.data)? else {
                    return Ok(respond(Vec::new()));
                };
                let verified =
                    upload::prepare_upload(&self.store, &data, self.config.max_allowlist_entries)?;
                self.suspend(upload::review_steps(&verified), PendingOp::Upload(verified))
            }
            INS_SIGN => {
                let Some((init, blob)) = self.sign_chunks.push(cmd.chunk_kind()?, &cmd.data)? else {
                    return Ok(respond(Vec::new()));
                };
                let pending = sign::prepare_sign(&init, blob)?;
                let steps = sign::review_steps(&pending.tx, self.config.expert_mode);
                self.suspend(steps, PendingOp::Sign(pending))
            }
            other => Err(LedgeracioError::UnsupportedInstruction(other)),
        }
    }

    fn suspend(&mut self, steps: Vec<ReviewStep>, op: PendingOp) -> Result<Reply, LedgeracioError> {
        self.approval.begin(steps)?;
        debug!(?op, "awaiting user review");
        self.pending = Some(op);
        Ok(Reply::Pending)
    }

    fn execute(&mut self, op: PendingOp) -> Result<Vec<u8>, LedgeracioError> {
        match op {
            PendingOp::SetAuthorityKey(key) => {
                authority::commit_set(&self.store, &key)?;
                Ok(Vec::new())
            }
            PendingOp::Upload(verified) => {
                upload::commit_upload(&self.store, verified)?;
                Ok(Vec::new())
            }
            PendingOp::Sign(pending) => {
                sign::finish_sign(&self.store, &self.signer, pending).map_err(|e| {
                    warn!(error = %e, "sign aborted after review");
                    e
                })
            }
        }
    }

    /// test_mode ‖ major ‖ minor ‖ patch ‖ locked ‖ target_id (BE).
    fn version(&self) -> Vec<u8> {
        let mut out = vec![
            self.config.test_mode as u8,
            version_component(env!("CARGO_PKG_VERSION_MAJOR")),
            version_component(env!("CARGO_PKG_VERSION_MINOR")),
            version_component(env!("CARGO_PKG_VERSION_PATCH")),
            0,
        ];
        out.extend_from_slice(&self.config.target_id.to_be_bytes());
        out
    }
}

fn respond(data: Vec<u8>) -> Reply {
    Reply::Respond(ApduResponse::ok(data))
}

fn version_component(s: &str) -> u8 {
    s.parse().unwrap_or(u8::MAX)
}
