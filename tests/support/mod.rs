#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A throwaway data directory for one test.
pub struct TestData {
    dir: TempDir,
}

impl TestData {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, rel_path: &str) -> PathBuf {
        self.dir.path().join(rel_path)
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.file(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_json(&self, rel_path: &str) -> Value {
        let raw = fs::read_to_string(self.file(rel_path)).expect("read json file");
        serde_json::from_str(&raw).expect("parse json file")
    }

    /// `eisen` pointed at this data directory, with ambient settings cleared.
    pub fn cmd(&self) -> Command {
        let mut cmd = eisen_cmd();
        cmd.env("EISEN_DATA_DIR", self.path());
        cmd
    }

    /// Run with `--json` and return the parsed envelope; the command must succeed.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }
}

pub fn eisen_cmd() -> Command {
    let mut cmd = Command::cargo_bin("eisen").expect("binary");
    cmd.env_remove("EISEN_DATA_DIR")
        .env_remove("EISEN_PROJECT")
        .env_remove("EISEN_EVENTS")
        .env_remove("RUST_LOG");
    cmd
}
