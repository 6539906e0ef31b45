//! External command execution.
//!
//! Turns a validated command string into an argv token list and runs it as
//! a child process, capturing real exit code, stdout, and stderr without
//! reinterpretation. Executable detection happens fresh on every run — no
//! process-wide state, no caching across calls.
//!
//! The command is split on whitespace with no shell-metacharacter handling.
//! No shell is involved (direct exec, not `sh -c`), so metacharacters pass
//! through as literal argv tokens, but quoted arguments from the backend
//! would be mangled by the naive split. Tightening this would change
//! observable behavior, so it is documented rather than fixed.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::prompt::MEMORY_FILE_PLACEHOLDER;

/// Hard wall-clock bound on one external command.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Which invocation form the host offers for Volatility 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// The `vol` entry point is on the search path.
    Short,
    /// Fall back to `python3 vol.py`.
    Script,
}

/// Final outcome of one command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    Completed {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    TimedOut,
    SpawnFailed(String),
}

/// Detect the invocation form by probing the search path for `vol`.
pub fn detect_invocation() -> Invocation {
    let dirs = env::var_os("PATH")
        .map(|p| env::split_paths(&p).collect::<Vec<_>>())
        .unwrap_or_default();
    if find_in_dirs("vol", dirs.iter().map(PathBuf::as_path)) {
        info!("detected 'vol' on the search path");
        Invocation::Short
    } else {
        info!("'vol' not found — using 'python3 vol.py'");
        Invocation::Script
    }
}

fn find_in_dirs<'a>(name: &str, dirs: impl Iterator<Item = &'a Path>) -> bool {
    dirs.map(|d| d.join(name)).any(|p| is_executable(&p))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Substitute the memory-file placeholder and split into argv tokens.
///
/// When the short form was detected but the backend emitted a long-form
/// first token (`vol.py` or `python3`), only that first token is rewritten
/// to `vol`. The script form runs the tokens as emitted.
pub fn build_tokens(command: &str, memory_file: &str, invocation: &Invocation) -> Vec<String> {
    let substituted = command.replace(MEMORY_FILE_PLACEHOLDER, memory_file);
    let mut tokens: Vec<String> = substituted.split_whitespace().map(str::to_string).collect();

    if *invocation == Invocation::Short
        && let Some(first) = tokens.first_mut()
        && (*first == "vol.py" || *first == "python3")
    {
        *first = "vol".to_string();
    }

    tokens
}

/// Capability seam for running the token list — the pipeline is generic
/// over this so tests can instrument execution with a stub.
pub trait CommandRunner {
    async fn run(&self, tokens: &[String]) -> ExecOutcome;
}

/// Production runner: spawns the tokens as a child process under
/// [`COMMAND_TIMEOUT`], capturing stdout and stderr separately. The child
/// is killed when the bound expires.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    pub timeout: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self { timeout: COMMAND_TIMEOUT }
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, tokens: &[String]) -> ExecOutcome {
        let Some((program, args)) = tokens.split_first() else {
            return ExecOutcome::SpawnFailed("empty command".to_string());
        };

        debug!(command = %tokens.join(" "), "executing command");

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(output)) => ExecOutcome::Completed {
                // None means signal-terminated; surface it as a failure code.
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Ok(Err(e)) => ExecOutcome::SpawnFailed(e.to_string()),
            Err(_) => ExecOutcome::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn placeholder_substituted_and_split() {
        let tokens = build_tokens(
            "vol -f <MEMORY_FILE> windows.pslist.PsList",
            "/tmp/mem.raw",
            &Invocation::Short,
        );
        assert_eq!(tokens, vec!["vol", "-f", "/tmp/mem.raw", "windows.pslist.PsList"]);
    }

    #[test]
    fn short_form_rewrites_long_first_token() {
        let tokens = build_tokens(
            "vol.py -f <MEMORY_FILE> windows.info.Info",
            "/m.raw",
            &Invocation::Short,
        );
        assert_eq!(tokens[0], "vol");

        let tokens = build_tokens(
            "python3 vol.py -f <MEMORY_FILE> windows.info.Info",
            "/m.raw",
            &Invocation::Short,
        );
        assert_eq!(tokens[0], "vol");
        // Only the first token is rewritten.
        assert_eq!(tokens[1], "vol.py");
    }

    #[test]
    fn script_form_runs_tokens_as_emitted() {
        let tokens = build_tokens(
            "vol.py -f <MEMORY_FILE> windows.info.Info",
            "/m.raw",
            &Invocation::Script,
        );
        assert_eq!(tokens[0], "vol.py");
    }

    #[test]
    fn finds_executable_in_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vol");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        assert!(find_in_dirs("vol", std::iter::once(dir.path())));
        assert!(!find_in_dirs("vol3", std::iter::once(dir.path())));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_not_found() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vol");
        fs::write(&path, "").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(!find_in_dirs("vol", std::iter::once(dir.path())));
    }

    #[tokio::test]
    async fn zero_exit_captures_stdout() {
        let runner = ProcessRunner::default();
        let tokens = vec!["echo".to_string(), "hello".to_string()];
        match runner.run(&tokens).await {
            ExecOutcome::Completed { exit_code, stdout, .. } => {
                assert_eq!(exit_code, 0);
                assert_eq!(stdout.trim(), "hello");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn nonzero_exit_captures_code_and_stderr() {
        let runner = ProcessRunner::default();
        let tokens: Vec<String> = ["sh", "-c", "echo oops >&2; exit 3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        match runner.run(&tokens).await {
            ExecOutcome::Completed { exit_code, stderr, .. } => {
                assert_eq!(exit_code, 3);
                assert!(stderr.contains("oops"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn over_budget_process_times_out() {
        let runner = ProcessRunner { timeout: Duration::from_millis(100) };
        let tokens = vec!["sleep".to_string(), "5".to_string()];
        assert_eq!(runner.run(&tokens).await, ExecOutcome::TimedOut);
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_failure() {
        let runner = ProcessRunner::default();
        let tokens = vec!["volnl-test-no-such-binary".to_string()];
        assert!(matches!(runner.run(&tokens).await, ExecOutcome::SpawnFailed(_)));
    }

    #[tokio::test]
    async fn empty_token_list_is_spawn_failure() {
        let runner = ProcessRunner::default();
        assert!(matches!(runner.run(&[]).await, ExecOutcome::SpawnFailed(_)));
    }
}
