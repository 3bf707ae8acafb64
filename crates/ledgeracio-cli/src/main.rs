//! ledgeracio-cli
//!
//! Host tool for the allowlist authority. Manages the ed25519 authority key,
//! signs allowlists, and frames them as APDUs for the device simulator.
//!
//! Usage:
//!   ledgeracio-cli keygen          [--keyfile <path>]
//!   ledgeracio-cli pubkey          [--keyfile <path>]
//!   ledgeracio-cli sign-allowlist  --nonce <n> --entry <hex>... [--keyfile <path>]
//!   ledgeracio-cli apdus           --ins <set-key|upload|sign> --data <hex>

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use ledgeracio_core::apdu::{chunk_command, ApduCommand};
use ledgeracio_core::constants::{
    BIP32_HARDENED, INS_ALLOWLIST_SET_PUBKEY, INS_ALLOWLIST_UPLOAD, INS_SIGN,
};
use ledgeracio_core::types::{Address, AllowlistNonce, Bip32Path};
use ledgeracio_crypto::{content_hash, AuthorityKeyPair};

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "ledgeracio-cli",
    version,
    about = "Ledgeracio allowlist authority: keys, signed allowlists, APDU framing"
)]
struct Args {
    /// Path to the authority keyfile (JSON).
    #[arg(long, global = true, default_value = "~/.ledgeracio/authority.json")]
    keyfile: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new authority keypair and save it to the keyfile.
    Keygen,

    /// Print the authority public key (hex), as sent with set-key.
    Pubkey,

    /// Sign an allowlist and print the upload payload.
    SignAllowlist {
        /// Allowlist nonce; must exceed the nonce committed on the device.
        #[arg(long)]
        nonce: AllowlistNonce,
        /// Allowed validator public key (32 bytes hex). Repeatable.
        #[arg(long = "entry")]
        entries: Vec<String>,
    },

    /// Frame a payload as device APDUs, one `apdu <hex>` line each.
    Apdus {
        #[arg(long, value_enum)]
        ins: Instruction,
        /// Payload (hex).
        #[arg(long)]
        data: String,
        /// Account index for signing (hardened).
        #[arg(long, default_value_t = 0)]
        account: u32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Instruction {
    /// Set the allowlist authority key.
    SetKey,
    /// Upload a signed allowlist.
    Upload,
    /// Sign a nomination payload.
    Sign,
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter("warn,ledgeracio_cli=info")
        .init();

    let args = Args::parse();
    let keyfile = expand_tilde(&args.keyfile);

    match args.command {
        Command::Keygen => cmd_keygen(&keyfile),

        Command::Pubkey => {
            let kp = load_keypair(&keyfile)?;
            println!("{}", kp.authority_key().to_hex());
            Ok(())
        }

        Command::SignAllowlist { nonce, entries } => {
            let kp = load_keypair(&keyfile)?;
            let entries = parse_entries(&entries)?;
            let hash = content_hash(nonce, &entries);
            let payload = kp.sign_allowlist(nonce, entries);
            info!(nonce, count = payload.count(), "allowlist signed");
            println!("Payload:      {}", hex::encode(payload.to_bytes()));
            println!("Content hash: {}", hash.to_hex());
            Ok(())
        }

        Command::Apdus { ins, data, account } => {
            let data = hex::decode(data.trim()).context("decoding payload hex")?;
            for cmd in frame(ins, &data, account)? {
                println!("apdu {}", hex::encode(cmd.to_bytes()));
            }
            Ok(())
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_keygen(keyfile: &Path) -> anyhow::Result<()> {
    if keyfile.exists() {
        bail!(
            "Keyfile {} already exists. Delete it first to generate a new key.",
            keyfile.display()
        );
    }
    if let Some(parent) = keyfile.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let kp = AuthorityKeyPair::generate();
    let json = serde_json::to_string_pretty(&kp)?;
    std::fs::write(keyfile, &json)
        .with_context(|| format!("writing keyfile to {}", keyfile.display()))?;

    println!("Generated new authority key.");
    println!("Public key: {}", kp.authority_key().to_hex());
    println!("Keyfile:    {}", keyfile.display());
    println!("\nThe device accepts exactly one authority key. Keep this file safe.");
    Ok(())
}

fn frame(ins: Instruction, data: &[u8], account: u32) -> anyhow::Result<Vec<ApduCommand>> {
    Ok(match ins {
        Instruction::SetKey => {
            if data.len() != 32 {
                bail!("authority key must be 32 bytes, got {}", data.len());
            }
            vec![ApduCommand::new(INS_ALLOWLIST_SET_PUBKEY, 0, 0, data.to_vec())]
        }
        Instruction::Upload => chunk_command(INS_ALLOWLIST_UPLOAD, &[], data),
        Instruction::Sign => {
            if account >= BIP32_HARDENED {
                bail!("account index {account} out of range");
            }
            let path = Bip32Path::new(account | BIP32_HARDENED, BIP32_HARDENED, BIP32_HARDENED);
            chunk_command(INS_SIGN, &path.to_le_bytes(), data)
        }
    })
}

fn parse_entries(entries: &[String]) -> anyhow::Result<Vec<Address>> {
    entries
        .iter()
        .map(|e| {
            Address::from_hex(e.trim_start_matches("0x"))
                .map_err(|err| anyhow::anyhow!("invalid entry {e}: {err}"))
        })
        .collect()
}

fn load_keypair(keyfile: &Path) -> anyhow::Result<AuthorityKeyPair> {
    let json = std::fs::read_to_string(keyfile)
        .with_context(|| format!("reading keyfile {}", keyfile.display()))?;
    let kp: AuthorityKeyPair = serde_json::from_str(&json)
        .context("parsing keyfile (is it a valid Ledgeracio authority keyfile?)")?;
    Ok(kp)
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgeracio_core::apdu::ChunkKind;

    #[test]
    fn set_key_is_one_command() {
        let cmds = frame(Instruction::SetKey, &[7; 32], 0).unwrap();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].ins, INS_ALLOWLIST_SET_PUBKEY);
        assert!(frame(Instruction::SetKey, &[7; 31], 0).is_err());
    }

    #[test]
    fn upload_is_chunked() {
        let cmds = frame(Instruction::Upload, &[1; 600], 0).unwrap();
        assert_eq!(cmds.len(), 4);
        assert!(cmds[0].data.is_empty());
        assert_eq!(cmds[3].chunk_kind().unwrap(), ChunkKind::Last);
    }

    #[test]
    fn sign_init_chunk_carries_path() {
        let cmds = frame(Instruction::Sign, &[1; 10], 2).unwrap();
        let path = Bip32Path::from_le_bytes(&cmds[0].data).unwrap();
        assert_eq!(path.0[2], 2 | BIP32_HARDENED);
        assert!(frame(Instruction::Sign, &[1; 10], BIP32_HARDENED).is_err());
    }

    #[test]
    fn entries_accept_prefixed_hex() {
        let hex = "11".repeat(32);
        let parsed = parse_entries(&[format!("0x{hex}"), hex.clone()]).unwrap();
        assert_eq!(parsed, vec![Address([0x11; 32]); 2]);
        assert!(parse_entries(&["abcd".into()]).is_err());
    }
}
