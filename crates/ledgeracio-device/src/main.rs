//! ledgeracio-device: host-side simulator of the Ledgeracio device app.
//!
//! Startup sequence:
//!   1. Open (or initialise) the allowlist store
//!   2. Load the device seed and app configuration
//!   3. Serve the line protocol on stdin/stdout until EOF
//!
//! All processing happens on one thread: a command either answers at once
//! or parks behind a review that only UI input (or the review timeout) ends.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::{info, warn};

use ledgeracio_app::{AppConfig, LedgeracioApp};
use ledgeracio_crypto::SeedSigner;
use ledgeracio_store::AllowlistStore;

mod session;
use session::{Input, ReviewDeadline, Session};

#[derive(Parser, Debug)]
#[command(
    name = "ledgeracio-device",
    version,
    about = "Ledgeracio device simulator: allowlist-gated nomination signing"
)]
struct Args {
    /// Directory for the persistent allowlist store.
    #[arg(long, default_value = "~/.ledgeracio/device")]
    data_dir: PathBuf,

    /// Device seed (32 bytes hex). A random seed is used when omitted.
    #[arg(long)]
    seed: Option<String>,

    /// Path to an app config JSON file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start in expert mode (condensed nomination review).
    #[arg(long, default_value_t = false)]
    expert: bool,

    /// Reject a pending review after this many seconds without UI input.
    #[arg(long)]
    review_timeout_secs: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ledgeracio=debug".into()),
        )
        .init();

    let args = Args::parse();
    info!("Ledgeracio device starting");

    // ── Allowlist store ───────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let store = AllowlistStore::open(&data_dir).context("opening allowlist store")?;
    match store.authority_key()? {
        Some(key) => info!(key = %key.to_hex(), "authority key provisioned"),
        None => info!("no authority key yet"),
    }

    // ── Seed and configuration ────────────────────────────────────────────────
    let seed = load_seed(args.seed.as_deref())?;
    let mut config = load_config(args.config.as_deref())?;
    config.expert_mode |= args.expert;
    info!(?config, "configuration loaded");

    let app = LedgeracioApp::new(store, SeedSigner::new(seed), config);
    let mut session = Session::new(app);
    let review_timeout = args.review_timeout_secs.map(Duration::from_secs);

    // ── Main loop ─────────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("device ready");
    let mut deadline = ReviewDeadline::new(review_timeout);
    loop {
        let next = match deadline.at() {
            Some(at) => match tokio::time::timeout_at(at, lines.next_line()).await {
                Ok(line) => line,
                Err(_) => {
                    emit(session.timeout());
                    deadline.observe(session.is_reviewing(), false, Instant::now());
                    continue;
                }
            },
            None => lines.next_line().await,
        };
        let Some(line) = next.context("reading stdin")? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match Input::parse(&line) {
            Ok(input) => {
                let ui_input = matches!(input, Input::Ui(_));
                emit(session.feed(input));
                deadline.observe(session.is_reviewing(), ui_input, Instant::now());
            }
            Err(e) => warn!(error = %e, line = %line.trim(), "ignoring input"),
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}

fn emit(line: Option<String>) {
    if let Some(line) = line {
        println!("{line}");
    }
}

fn load_seed(hex_seed: Option<&str>) -> anyhow::Result<[u8; 32]> {
    match hex_seed {
        Some(h) => {
            let bytes = hex::decode(h).context("decoding seed hex")?;
            if bytes.len() != 32 {
                bail!("seed must be 32 bytes (64 hex chars), got {}", bytes.len());
            }
            let mut seed = [0u8; 32];
            seed.copy_from_slice(&bytes);
            Ok(seed)
        }
        None => {
            warn!("no --seed given, using an ephemeral device seed");
            Ok(rand::random())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let path = expand_tilde(path);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing config {}", path.display()))
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
