//! Shared harness for satchel integration tests.

use std::process::Output;

use assert_cmd::Command;
use tempfile::TempDir;

/// Isolated project and config directories for one test.
///
/// Commands run with the project directory as their working directory and
/// `SATCHEL_CONFIG_DIR` pointing at the temp config dir, so nothing
/// touches the real home.
pub struct TestEnv {
    pub dir: TempDir,
    pub config: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp project dir"),
            config: TempDir::new().expect("failed to create temp config dir"),
        }
    }

    /// A satchel command wired to the isolated directories.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("satchel").expect("failed to find satchel binary");
        cmd.current_dir(self.dir.path());
        cmd.env("SATCHEL_CONFIG_DIR", self.config.path());
        cmd.env("NO_COLOR", "1");
        cmd
    }

    pub fn satchel(&self, args: &[&str]) -> Output {
        self.cmd().args(args).output().expect("failed to run satchel")
    }

    pub fn init(&self) -> Output {
        self.satchel(&["init", "demo"])
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed\nstdout: {}\nstderr: {}",
        stdout(output),
        stderr(output)
    );
}

pub fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "command unexpectedly succeeded\nstdout: {}",
        stdout(output)
    );
}
