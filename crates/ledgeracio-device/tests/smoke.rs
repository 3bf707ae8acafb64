//! End-to-end smoke test for ledgeracio-device.
//!
//! Starts the simulator process with a fresh store, drives it through the
//! line protocol, and checks the responses it prints.
//!
//! Run with:
//!   cargo test -p ledgeracio-device --test smoke

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

// ── Process helpers ───────────────────────────────────────────────────────────

struct DataDir(PathBuf);

impl DataDir {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("ledgeracio_smoke_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        Self(dir)
    }
}

impl Drop for DataDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// Feed `script` on stdin, wait for exit at EOF, and return the output.
fn run_device(dir: &DataDir, extra: &[&str], script: &[String]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_ledgeracio-device"))
        .arg("--data-dir")
        .arg(&dir.0)
        .arg("--seed")
        .arg("11".repeat(32))
        .args(extra)
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn ledgeracio-device");
    {
        let stdin = child.stdin.as_mut().unwrap();
        for line in script {
            writeln!(stdin, "{line}").unwrap();
        }
    }
    drop(child.stdin.take());
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success(), "device exited with {:?}", out.status);
    out
}

fn stdout_lines(out: &Output) -> Vec<String> {
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

fn apdu(ins: u8, data: &[u8]) -> String {
    let mut raw = vec![0x99, ins, 0x00, 0x00, data.len() as u8];
    raw.extend_from_slice(data);
    format!("apdu {}", hex::encode(raw))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn provision_key_and_read_back() {
    let dir = DataDir::new("provision");
    let key = [0x12u8; 32];
    let script = vec![
        apdu(0x00, &[]),
        apdu(0x90, &[]),
        apdu(0x91, &key),
        // Busy while the review is open.
        apdu(0x00, &[]),
        "right".into(),
        "right".into(),
        "both".into(),
        apdu(0x90, &[]),
    ];
    let out = run_device(&dir, &[], &script);
    assert_eq!(
        stdout_lines(&out),
        vec![
            "0000010000311000049000".to_string(),
            "6986".into(),
            "pending".into(),
            "9001".into(),
            "9000".into(),
            format!("{}9000", hex::encode(key)),
        ]
    );
}

#[test]
fn authority_key_persists_across_restarts() {
    let dir = DataDir::new("persist");
    let key = [0x34u8; 32];
    let script = vec![apdu(0x91, &key), "right".into(), "right".into(), "both".into()];
    run_device(&dir, &[], &script);

    let out = run_device(&dir, &[], &[apdu(0x90, &[]), apdu(0x91, &key)]);
    assert_eq!(
        stdout_lines(&out),
        vec![format!("{}9000", hex::encode(key)), "6986".to_string()]
    );
}

#[test]
fn review_timeout_rejects() {
    let dir = DataDir::new("timeout");
    let mut child = Command::new(env!("CARGO_BIN_EXE_ledgeracio-device"))
        .arg("--data-dir")
        .arg(&dir.0)
        .args(["--review-timeout-secs", "1"])
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn ledgeracio-device");
    writeln!(child.stdin.as_mut().unwrap(), "{}", apdu(0x91, &[0x56; 32])).unwrap();
    std::thread::sleep(std::time::Duration::from_secs(3));
    drop(child.stdin.take());
    let out = child.wait_with_output().unwrap();
    assert_eq!(stdout_lines(&out), vec!["pending".to_string(), "6985".into()]);
}

#[test]
fn host_polling_does_not_extend_review() {
    let dir = DataDir::new("polling");
    let mut child = Command::new(env!("CARGO_BIN_EXE_ledgeracio-device"))
        .arg("--data-dir")
        .arg(&dir.0)
        .args(["--review-timeout-secs", "1"])
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn ledgeracio-device");
    {
        let stdin = child.stdin.as_mut().unwrap();
        writeln!(stdin, "{}", apdu(0x91, &[0x56; 32])).unwrap();
        for _ in 0..7 {
            std::thread::sleep(std::time::Duration::from_millis(600));
            writeln!(stdin, "{}", apdu(0x00, &[])).unwrap();
            writeln!(stdin, "garbage").unwrap();
        }
    }
    drop(child.stdin.take());
    let out = child.wait_with_output().unwrap();
    let lines = stdout_lines(&out);

    assert_eq!(lines[0], "pending");
    let rejected = lines
        .iter()
        .position(|l| l == "6985")
        .expect("review must expire without UI input");
    assert!(lines[1..rejected].iter().all(|l| l == "9001"));
    assert!(rejected <= 3, "expired late: {lines:?}");
    assert!(lines[rejected + 1..]
        .iter()
        .all(|l| l == "0000010000311000049000"));
}

#[test]
fn malformed_lines_are_ignored() {
    let dir = DataDir::new("malformed");
    let out = run_device(&dir, &[], &["bogus".into(), "apdu xyz".into(), apdu(0x00, &[])]);
    assert_eq!(stdout_lines(&out), vec!["0000010000311000049000".to_string()]);
}
