//! Test helpers for behavioral specifications.
//!
//! Provides a high-level DSL for testing the `forge` CLI binary.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// Aggressive timeouts for fast tests.
const FORGE_TIMEOUT_CONNECT_MS: &str = "2000";
const FORGE_TIMEOUT_EXIT_MS: &str = "500";
const FORGE_TIMEOUT_IPC_MS: &str = "500";
const FORGE_CONNECT_POLL_MS: &str = "5";

/// Returns the path to a binary, checking llvm-cov target directory first.
/// This works with both standard builds and llvm-cov coverage runs.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn forge_binary() -> PathBuf {
    binary_path("forge")
}

pub fn forged_binary() -> PathBuf {
    binary_path("forged")
}

/// Create a CLI builder for `forge` commands.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// High-level CLI builder for fluent test assertions.
pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
    home: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            dir: None,
            home: None,
            envs: vec![
                ("FORGE_DAEMON_BINARY".into(), forged_binary().to_string_lossy().into()),
                ("FORGE_TIMEOUT_CONNECT_MS".into(), FORGE_TIMEOUT_CONNECT_MS.into()),
                ("FORGE_TIMEOUT_EXIT_MS".into(), FORGE_TIMEOUT_EXIT_MS.into()),
                ("FORGE_TIMEOUT_IPC_MS".into(), FORGE_TIMEOUT_IPC_MS.into()),
                ("FORGE_CONNECT_POLL_MS".into(), FORGE_CONNECT_POLL_MS.into()),
            ],
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    /// Point `dirs::home_dir()` at an isolated directory, so token-store
    /// tests never touch the real user's `~/.forge`.
    pub fn home(mut self, path: impl Into<PathBuf>) -> Self {
        self.home = Some(path.into());
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.envs.push((key.to_string(), value.as_ref().to_string()));
        self
    }

    pub fn stdin(self, input: &str) -> StdinCliBuilder {
        StdinCliBuilder { inner: self, input: input.to_string() }
    }

    fn command(self) -> Command {
        let mut cmd = Command::new(forge_binary());
        cmd.args(&self.args);

        if let Some(dir) = self.dir {
            cmd.current_dir(dir);
        }
        if let Some(home) = self.home {
            cmd.env("HOME", home);
        }
        for (key, value) in self.envs {
            cmd.env(key, value);
        }

        cmd
    }

    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// A [`CliBuilder`] with stdin content queued (for `login`, which reads a
/// token from stdin).
pub struct StdinCliBuilder {
    inner: CliBuilder,
    input: String,
}

impl StdinCliBuilder {
    pub fn passes(self) -> RunAssert {
        self.run(true)
    }

    pub fn fails(self) -> RunAssert {
        self.run(false)
    }

    fn run(self, expect_success: bool) -> RunAssert {
        use std::io::Write;
        use std::process::Stdio;

        let mut cmd = self.inner.command();
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        let mut child = cmd.spawn().expect("command should spawn");
        child
            .stdin
            .take()
            .expect("stdin should be piped")
            .write_all(self.input.as_bytes())
            .expect("should write to stdin");
        let output = child.wait_with_output().expect("command should run");
        assert_eq!(
            output.status.success(),
            expect_success,
            "unexpected exit status {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions.
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{}'\nstdout: {}", expected, stdout);
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{}'\nstderr: {}", expected, stderr);
        self
    }
}

// =============================================================================
// Project
// =============================================================================

/// A temporary project directory plus an isolated "home" for token storage.
pub struct Project {
    dir: tempfile::TempDir,
    home_dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            home_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn home_path(&self) -> &Path {
        self.home_dir.path()
    }

    pub fn file(&self, path: impl AsRef<Path>, content: &str) {
        let full_path = self.dir.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full_path, content).unwrap();
    }

    /// Run `forge` in this project's context, with an isolated home.
    pub fn forge(&self) -> CliBuilder {
        cli().pwd(self.path()).home(self.home_path())
    }
}
