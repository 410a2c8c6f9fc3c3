//! Integration tests for the `chainsmith` CLI.
//!
//! Every test runs the binary in its own temporary directory, so catalog
//! discovery only sees what the test puts there.

mod catalog;
mod check;
mod cli;

use std::path::Path;

use tempfile::TempDir;
use xshell::{Shell, cmd};

/// Create an empty temporary working directory.
pub fn workdir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

/// Create a temporary working directory containing the given files.
pub fn workdir_with(files: &[(&str, &str)]) -> TempDir {
    let dir = workdir();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write file");
    }
    dir
}

/// Run a chainsmith subcommand in `dir` and return (exit_code, stdout, stderr).
pub fn run_chainsmith(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let sh = Shell::new().expect("create shell");
    sh.change_dir(dir);

    let manifest = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
    let output = cmd!(sh, "cargo run --quiet --manifest-path {manifest} -- {args...}")
        .env_remove("CHAINSMITH_CONFIG")
        .env_remove("CHAINSMITH_LOG")
        .ignore_status()
        .quiet()
        .output()
        .expect("failed to run chainsmith");

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (exit_code, stdout, stderr)
}
