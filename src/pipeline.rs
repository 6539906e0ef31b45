//! Pipeline orchestration: translate → validate → resolve → execute.
//!
//! One invocation is a single synchronous call chain that always produces
//! exactly one human-readable string, whichever stage it ends at. There
//! are no retries and no backward transitions — any failure short-circuits
//! to a terminal message so a human always sees why nothing (or something
//! unverified) happened.
//!
//! Gate order is load-bearing: confidence is checked before the version
//! claim, so a low-confidence response never reaches execution even when
//! it happens to claim version 3.

use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::executor::{self, CommandRunner, ExecOutcome};
use crate::host::HostContext;
use crate::prompt;
use crate::resolver;
use crate::response::{self, AiResponse, Confidence};

/// Gate progression for one run. Strictly sequential; recorded for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Received,
    ConfidenceChecked,
    VersionChecked,
    LocationResolved,
    Executed,
}

/// Run the full pipeline for `query`.
///
/// Backend failures of any kind collapse to the Unknown response sentinel,
/// which the confidence gate then turns into a terminal message.
pub async fn run<R: CommandRunner>(
    query: &str,
    backend: &Backend,
    ctx: &HostContext,
    runner: &R,
) -> String {
    info!(backend = backend.name(), "received query");

    let rendered = prompt::render(query);
    let response = match backend.interpret(&rendered).await {
        Ok(raw) => response::extract(&raw),
        Err(failure) => {
            warn!(backend = backend.name(), %failure, "backend call failed");
            AiResponse::unknown()
        }
    };

    validate_and_execute(&response, ctx, runner).await
}

/// Gate-check `response` and, only if every gate passes, resolve the image
/// path and execute the command. Public so integration tests can drive the
/// state machine with pre-built responses and an instrumented runner.
pub async fn validate_and_execute<R: CommandRunner>(
    response: &AiResponse,
    ctx: &HostContext,
    runner: &R,
) -> String {
    let mut stage = Stage::Received;
    debug!(?stage, version = %response.volatility_version, "validating response");

    if response.confidence != Confidence::High {
        return format!(
            "AI is not confident in the command generated. Please refine your query.\n\
             Suggested command (unverified): {}",
            response.command
        );
    }
    stage = Stage::ConfidenceChecked;
    debug!(?stage, "confidence gate passed");

    if response.volatility_version != "3" {
        return format!(
            "AI generated command for Volatility {}, but this is Volatility 3. Command not executed.\n\
             Suggested command: {}",
            response.volatility_version, response.command
        );
    }
    stage = Stage::VersionChecked;
    debug!(?stage, "version gate passed");

    let memory_file = match resolver::resolve(ctx) {
        Ok(path) => path,
        Err(e) => {
            return format!(
                "Error getting memory file path: {e}\nSuggested command: {}",
                response.command
            );
        }
    };
    stage = Stage::LocationResolved;
    debug!(?stage, %memory_file, "location resolved");

    // Detection is fresh on every execution — no cross-call caching.
    let invocation = executor::detect_invocation();
    let tokens = executor::build_tokens(&response.command, &memory_file, &invocation);

    info!(command = %tokens.join(" "), "executing validated command");
    let outcome = runner.run(&tokens).await;
    stage = Stage::Executed;
    debug!(?stage, "execution finished");

    match outcome {
        ExecOutcome::Completed { exit_code: 0, stdout, .. } => stdout,
        ExecOutcome::Completed { exit_code, stderr, .. } => {
            format!("Command failed with return code {exit_code}:\n{stderr}")
        }
        ExecOutcome::TimedOut => "Command timed out after 5 minutes.".to_string(),
        ExecOutcome::SpawnFailed(e) => format!("Error executing command: {e}"),
    }
}
