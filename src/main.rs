//! volnl — natural-language front end for Volatility 3.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI args
//!   3. Load config
//!   4. Resolve effective log level (CLI `-v` flags > env > config)
//!   5. Init logger once
//!   6. Build the backend from the registry
//!   7. `--check`: ping the backend and exit
//!   8. Load the session context, run the pipeline, print the result
//!
//! The binary is only the host shim: it collects the query, backend
//! selection, and session context the way the surrounding plugin framework
//! would. All control flow lives in the library.

use tracing::info;

use volnl::error::AppError;
use volnl::executor::ProcessRunner;
use volnl::host::HostContext;
use volnl::{backend, config, logger, pipeline};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let mut config = config::load(args.config_path.as_deref())?;
    if let Some(backend_name) = &args.backend {
        config.backend.default = backend_name.clone();
    }
    if let Some(model) = &args.model {
        config.backend.ollama.model = model.clone();
        config.backend.openai.model = model.clone();
    }

    // Each -v raises one tier from the configured level.
    let effective_log_level = match args.verbosity {
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    logger::init(effective_log_level, args.verbosity > 0)?;

    info!(
        backend = %config.backend.default,
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    let backend = backend::build(&config.backend, config.api_key.clone())
        .map_err(|e| AppError::Backend(e.to_string()))?;

    if args.check {
        return match backend.ping().await {
            Ok(()) => {
                println!("✓ {} backend reachable", backend.name());
                Ok(())
            }
            Err(e) => Err(AppError::Backend(format!(
                "{} backend not reachable: {e}",
                backend.name()
            ))),
        };
    }

    let Some(session_path) = &args.session_path else {
        return Err(AppError::Session(
            "no session context provided. Use -s/--session <file.toml>".into(),
        ));
    };
    let ctx = HostContext::from_path(std::path::Path::new(session_path))?;

    let Some(query) = &args.query else {
        return Err(AppError::Config(
            "no query provided. Pass your request as the positional argument".into(),
        ));
    };

    let runner = ProcessRunner::default();
    let result = pipeline::run(query, &backend, &ctx, &runner).await;
    println!("{result}");

    Ok(())
}

struct CliArgs {
    query: Option<String>,
    config_path: Option<String>,
    session_path: Option<String>,
    backend: Option<String>,
    model: Option<String>,
    check: bool,
    verbosity: u8,
}

fn parse_cli_args() -> CliArgs {
    let mut args = CliArgs {
        query: None,
        config_path: None,
        session_path: None,
        backend: None,
        model: None,
        check: false,
        verbosity: 0,
    };
    let mut positionals: Vec<String> = Vec::new();

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: volnl [OPTIONS] <QUERY>");
                println!();
                println!("Options:");
                println!("  -h, --help              Print help");
                println!("  -f, --config <PATH>     Path to configuration file (default: config/default.toml)");
                println!("  -s, --session <PATH>    Path to session context TOML (host layer tree)");
                println!("      --backend <NAME>    Backend override: ollama or openai");
                println!("      --model <NAME>      Model override for the active backend");
                println!("      --check             Ping the configured backend and exit");
                println!("  -v, -vv                 Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => args.config_path = require_value(&mut iter, "-f/--config"),
            "-s" | "--session" => args.session_path = require_value(&mut iter, "-s/--session"),
            "--backend" => args.backend = require_value(&mut iter, "--backend"),
            "--model" => args.model = require_value(&mut iter, "--model"),
            "--check" => args.check = true,
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                args.verbosity = args.verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => positionals.push(arg),
        }
    }

    if !positionals.is_empty() {
        args.query = Some(positionals.join(" "));
    }
    args
}

fn require_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Option<String> {
    match iter.next() {
        Some(value) => Some(value),
        None => {
            eprintln!("error: {flag} requires an argument");
            std::process::exit(1);
        }
    }
}
