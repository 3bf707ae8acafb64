//! Line protocol between the simulator's stdin/stdout and the app.
//!
//! Input lines:
//!   apdu <hex>     raw command
//!   right | left   next / previous review page
//!   both           confirm the current page
//!   reject         reject the review outright
//!   expert on|off  toggle condensed review
//!
//! Output: `pending` when a review starts, otherwise the response as
//! `<hex data ‖ SW>`.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use tokio::time::Instant;
use tracing::info;

use ledgeracio_app::{LedgeracioApp, Reply, Screen, UiEvent};
use ledgeracio_core::apdu::ApduResponse;
use ledgeracio_crypto::DeviceSigner;

pub const PENDING: &str = "pending";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Apdu(Vec<u8>),
    Ui(UiEvent),
    Expert(bool),
}

impl Input {
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let mut words = line.split_whitespace();
        let cmd = words.next().ok_or_else(|| anyhow!("empty line"))?;
        let input = match cmd {
            "apdu" => {
                let data = words.next().ok_or_else(|| anyhow!("apdu needs a hex argument"))?;
                Input::Apdu(hex::decode(data).context("decoding apdu hex")?)
            }
            "right" => Input::Ui(UiEvent::Next),
            "left" => Input::Ui(UiEvent::Previous),
            "both" => Input::Ui(UiEvent::Confirm),
            "reject" => Input::Ui(UiEvent::Reject),
            "expert" => match words.next() {
                Some("on") => Input::Expert(true),
                Some("off") => Input::Expert(false),
                other => bail!("expert expects on|off, got {other:?}"),
            },
            other => bail!("unknown command '{other}'"),
        };
        if let Some(extra) = words.next() {
            bail!("unexpected argument '{extra}'");
        }
        Ok(input)
    }
}

pub struct Session<S: DeviceSigner> {
    app: LedgeracioApp<S>,
}

impl<S: DeviceSigner> Session<S> {
    pub fn new(app: LedgeracioApp<S>) -> Self {
        Self { app }
    }

    pub fn is_reviewing(&self) -> bool {
        self.app.is_reviewing()
    }

    /// Apply one input; returns the line to print, if any.
    pub fn feed(&mut self, input: Input) -> Option<String> {
        match input {
            Input::Apdu(raw) => match self.app.handle_apdu(&raw) {
                Reply::Respond(resp) => Some(encode(&resp)),
                Reply::Pending => {
                    self.log_screen();
                    Some(PENDING.to_string())
                }
            },
            Input::Ui(event) => self.ui(event),
            Input::Expert(enabled) => {
                self.app.set_expert_mode(enabled);
                None
            }
        }
    }

    /// The review sat unanswered past the configured timeout.
    pub fn timeout(&mut self) -> Option<String> {
        info!("review timed out");
        self.ui(UiEvent::Timeout)
    }

    fn ui(&mut self, event: UiEvent) -> Option<String> {
        let resp = self.app.handle_ui(event);
        if resp.is_none() {
            self.log_screen();
        }
        resp.map(|r| encode(&r))
    }

    fn log_screen(&self) {
        match self.app.screen() {
            Some(Screen::Field { index, total, step }) => {
                info!("[{}/{}] {}: {}", index + 1, total, step.title, step.value)
            }
            Some(Screen::Approve) => info!("APPROVE"),
            Some(Screen::Reject) => info!("REJECT"),
            None => {}
        }
    }
}

/// Expiry of the open review. Host traffic never extends it; only UI input
/// does.
#[derive(Debug)]
pub struct ReviewDeadline {
    limit: Option<Duration>,
    at: Option<Instant>,
}

impl ReviewDeadline {
    pub fn new(limit: Option<Duration>) -> Self {
        Self { limit, at: None }
    }

    pub fn at(&self) -> Option<Instant> {
        self.at
    }

    /// Record the session state after one input was applied.
    pub fn observe(&mut self, reviewing: bool, ui_input: bool, now: Instant) {
        let Some(limit) = self.limit else {
            return;
        };
        if !reviewing {
            self.at = None;
        } else if self.at.is_none() || ui_input {
            self.at = Some(now + limit);
        }
    }
}

fn encode(resp: &ApduResponse) -> String {
    hex::encode(resp.to_bytes())
}
