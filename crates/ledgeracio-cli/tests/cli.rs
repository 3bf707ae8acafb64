//! Runs the authority tool as a process against a scratch keyfile.
//!
//! Run with:
//!   cargo test -p ledgeracio-cli --test cli

use std::path::PathBuf;
use std::process::{Command, Output};

struct Scratch(PathBuf);

impl Scratch {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("ledgeracio_cli_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        Self(dir)
    }

    fn keyfile(&self) -> PathBuf {
        self.0.join("authority.json")
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn cli(keyfile: &PathBuf, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ledgeracio-cli"))
        .arg("--keyfile")
        .arg(keyfile)
        .args(args)
        .output()
        .expect("run ledgeracio-cli")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn keygen_then_pubkey() {
    let scratch = Scratch::new("keygen");
    let keyfile = scratch.keyfile();

    let out = cli(&keyfile, &["keygen"]);
    assert!(out.status.success());
    assert!(keyfile.exists());

    // Refuses to overwrite.
    assert!(!cli(&keyfile, &["keygen"]).status.success());

    let out = cli(&keyfile, &["pubkey"]);
    assert!(out.status.success());
    let pk = stdout(&out).trim().to_string();
    assert_eq!(pk.len(), 64);
    assert!(hex::decode(&pk).is_ok());
}

#[test]
fn sign_allowlist_prints_payload_and_hash() {
    let scratch = Scratch::new("sign");
    let keyfile = scratch.keyfile();
    assert!(cli(&keyfile, &["keygen"]).status.success());

    let entry = "c60eb01cb98c5a12fc0815893afbf503fe8238a4791a70bfebe27ce8f311990a";
    let out = cli(&keyfile, &["sign-allowlist", "--nonce", "10", "--entry", entry]);
    assert!(out.status.success());
    let text = stdout(&out);
    let payload = text
        .lines()
        .find_map(|l| l.strip_prefix("Payload:"))
        .unwrap()
        .trim();
    // nonce ‖ count ‖ one entry ‖ signature
    assert_eq!(payload.len(), (8 + 32 + 64) * 2);
    assert!(payload.starts_with("0a00000001000000c60eb01c"));
    assert!(text.contains("Content hash: "));
}

#[test]
fn missing_keyfile_fails() {
    let scratch = Scratch::new("missing");
    let out = cli(&scratch.keyfile(), &["pubkey"]);
    assert!(!out.status.success());
}

#[test]
fn apdus_frame_upload() {
    let scratch = Scratch::new("apdus");
    let out = cli(&scratch.keyfile(), &["apdus", "--ins", "upload", "--data", &"ab".repeat(300)]);
    assert!(out.status.success());
    let lines: Vec<String> = stdout(&out).lines().map(str::to_string).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "apdu 9993000000");
    assert!(lines[1].starts_with("apdu 99930100fa"));
    assert!(lines[2].starts_with("apdu 9993020032"));
}
