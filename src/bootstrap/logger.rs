//! Diagnostic logging for smartqa.
//!
//! Answers printed by `ask`, `rag` and the console REPL go to stdout, so
//! diagnostics never do: they are written to stderr, or appended to the
//! configured `log_file`. The level comes from `-v` flags, `log_level` in the
//! config, or `RUST_LOG`. The HTTP client and server crates are held at
//! `warn` unless a directive names them.

use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::AppError;

/// Dependencies that are noisy at `debug`.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

/// Install the global subscriber. Call once, after config is loaded.
///
/// With `prefer_level` (a level given on the command line) `level` wins and
/// `RUST_LOG` is only consulted if `level` does not parse; otherwise
/// `RUST_LOG` wins and `level` is the fallback.
pub fn init(level: &str, prefer_level: bool, log_file: Option<&Path>) -> Result<(), AppError> {
    let filter = build_filter(level, prefer_level)?;
    let writer = open_writer(log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

/// Resolve the filter from `level` and `RUST_LOG`, then quiet
/// [`QUIET_TARGETS`] the directives leave unmentioned.
pub fn build_filter(level: &str, prefer_level: bool) -> Result<EnvFilter, AppError> {
    let from_env = || std::env::var("RUST_LOG").ok().filter(|v| !v.trim().is_empty());
    let (source, directives) = match (prefer_level, from_env()) {
        (false, Some(env)) => ("RUST_LOG", env),
        (true, Some(env)) if EnvFilter::try_new(level).is_err() => ("RUST_LOG", env),
        _ => ("log level", level.to_string()),
    };

    let mut filter = EnvFilter::try_new(&directives)
        .map_err(|e| AppError::Logger(format!("invalid {source} '{directives}': {e}")))?;
    for target in QUIET_TARGETS {
        if directives.contains(target) {
            continue;
        }
        let directive = format!("{target}=warn")
            .parse()
            .map_err(|e| AppError::Logger(format!("bad directive for {target}: {e}")))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

fn open_writer(log_file: Option<&Path>) -> Result<BoxMakeWriter, AppError> {
    let Some(path) = log_file else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::Logger(format!("failed to create log dir '{}': {e}", parent.display()))
        })?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::Logger(format!("failed to open log file '{}': {e}", path.display())))?;
    Ok(BoxMakeWriter::new(file))
}
