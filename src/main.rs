//! SmartQA — command-line entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Run the requested command; `serve` builds the engines, spawns a
//!      Ctrl-C → shutdown watcher and drives the comms channels until
//!      shutdown

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use smartqa::config::{self, Config};
use smartqa::error::AppError;
use smartqa::llm::{LlmProvider, providers};
use smartqa::logger;
use smartqa::subsystems::comms::{self, Services};
use smartqa::subsystems::history::ChatHistory;
use smartqa::subsystems::knowledge::KnowledgeStore;
use smartqa::subsystems::qa::QaEngine;
use smartqa::subsystems::rag::RagService;
use smartqa::subsystems::settings::SettingsStore;

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

    let args = parse_cli_args()?;

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    let force_cli_level = args.log_level.is_some();

    logger::init(effective_log_level, force_cli_level, config.log_file.as_deref())?;

    info!(
        app = %config.app_name,
        work_dir = %config.work_dir.display(),
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    match args.command {
        Command::Serve => serve(&config, args.interactive).await,
        Command::Ask(question) => {
            let engine = QaEngine::open(&config);
            let answer = tokio::task::spawn_blocking(move || engine.answer(&question))
                .await
                .map_err(|e| AppError::Comms(format!("faq task failed: {e}")))?;
            println!("{}", answer.text);
            Ok(())
        }
        Command::Rag(question) => {
            let rag = RagService::open(&config, build_llm(&config)?)?;
            let answer = rag.ask(&question, None).await?;
            println!("{}", answer.answer);
            Ok(())
        }
        Command::Index(dir) => {
            let dir = dir.unwrap_or_else(|| config.rag.docs_dir.clone());
            let rag = RagService::open(&config, build_llm(&config)?)?;
            let report = rag.index_dir(&dir).await?;
            println!(
                "indexed {}: {} files, {} inserted, {} updated, {} unchanged, {} removed, {} skipped",
                dir.display(),
                report.files,
                report.inserted,
                report.updated,
                report.unchanged,
                report.removed,
                report.skipped
            );
            Ok(())
        }
        Command::Repair(file) => repair(&file.unwrap_or_else(|| config.knowledge.path.clone())),
    }
}

fn build_llm(config: &Config) -> Result<LlmProvider, AppError> {
    providers::build(&config.llm, config.llm_api_key.clone())
        .map_err(|e| AppError::Config(e.to_string()))
}

async fn serve(config: &Config, interactive: bool) -> Result<(), AppError> {
    let services = Services {
        qa: Arc::new(QaEngine::open(config)),
        rag: Arc::new(RagService::open(config, build_llm(config)?)?),
        settings: Arc::new(SettingsStore::open(&config.settings.path)?),
        history: Arc::new(ChatHistory::open(&config.history.path, config.history.cap)),
    };

    if !interactive && !config.server_should_load() {
        return Err(AppError::Config(
            "nothing to serve: enable [server] or pass -i for the console".into(),
        ));
    }

    print_startup_summary(config, &services, interactive);

    // Shared shutdown token — Ctrl-C cancels it, all tasks watch it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    let comms = comms::start(config, services, interactive, shutdown.clone());
    let result = comms.join().await;

    // If the console exited on EOF (not Ctrl-C), still stop everything else.
    shutdown.cancel();

    if interactive {
        use std::io::Write as _;
        println!("\nBye :) ...");
        let _ = std::io::stdout().flush();
    }
    result
}

/// Rewrite a damaged knowledge-base file from whatever records survive,
/// keeping the original alongside as `<file>.bak`.
fn repair(path: &Path) -> Result<(), AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::Knowledge(format!("cannot read {}: {e}", path.display())))?;
    let (store, outcome) = KnowledgeStore::from_damaged(&text);

    let mut backup = path.as_os_str().to_owned();
    backup.push(".bak");
    let backup = PathBuf::from(backup);
    std::fs::write(&backup, &text)?;
    store.save(path)?;

    info!(?outcome, backup = %backup.display(), "knowledge base rewritten");
    println!(
        "repaired {}: {} records kept ({:?}); original saved to {}",
        path.display(),
        store.len(),
        outcome,
        backup.display()
    );
    Ok(())
}

fn print_startup_summary(config: &Config, services: &Services, interactive: bool) {
    let faq = services.qa.stats();
    let http = if config.server_should_load() {
        config.server.bind.as_str()
    } else {
        "disabled"
    };

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ SmartQA                                                      ║");
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ faq records: {:<48}║", format!("{} ({} categories)", faq.records, faq.categories.len()));
    println!("║ model:       {:<48}║", services.rag.model());
    println!("║ http:        {:<48}║", http);
    println!("║ console:     {:<48}║", if interactive { "enabled" } else { "disabled" });
    println!("╚══════════════════════════════════════════════════════════════╝");

    if interactive {
        println!("Type /help for help");
    }
}

// ── CLI ───────────────────────────────────────────────────────────────────────

enum Command {
    Serve,
    Ask(String),
    Rag(String),
    Index(Option<PathBuf>),
    Repair(Option<PathBuf>),
}

struct CliArgs {
    log_level: Option<&'static str>,
    interactive: bool,
    config_path: Option<String>,
    command: Command,
}

fn print_usage() {
    println!("Usage: smartqa [OPTIONS] [COMMAND]");
    println!();
    println!("Commands:");
    println!("  serve                      Run the configured channels (default)");
    println!("  ask <QUESTION>             Answer one question from the FAQ knowledge base");
    println!("  rag <QUESTION>             Answer one question from the indexed documents");
    println!("  index [DIR]                Index a document folder (default: rag.docs_dir)");
    println!("  repair [FILE]              Rewrite a damaged knowledge-base file (keeps FILE.bak)");
    println!();
    println!("Options:");
    println!("  -h, --help                 Print help");
    println!("  -i, --interactive          Enable the console channel");
    println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
    println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
}

fn parse_cli_args() -> Result<CliArgs, AppError> {
    let mut verbosity = 0u8;
    let mut interactive = false;
    let mut config_path = None;
    let mut positional: Vec<String> = Vec::new();

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            positional.extend(iter.by_ref());
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "-i" | "--interactive" => interactive = true,
            "-f" | "--config" => match iter.next() {
                Some(path) => config_path = Some(path),
                None => return Err(AppError::Config("-f/--config requires a path argument".into())),
            },
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => positional.push(arg),
        }
    }

    // Each -v raises verbosity one tier from the config default:
    //   -v      → warn
    //   -vv     → info
    //   -vvv    → debug
    //   -vvvv+  → trace
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    let mut words = positional.into_iter();
    let command = match words.next().as_deref() {
        None | Some("serve") => Command::Serve,
        Some(cmd @ ("ask" | "rag")) => {
            let question = words.collect::<Vec<_>>().join(" ");
            if question.trim().is_empty() {
                return Err(AppError::Config(format!("`{cmd}` requires a question")));
            }
            if cmd == "ask" { Command::Ask(question) } else { Command::Rag(question) }
        }
        Some("index") => Command::Index(words.next().map(PathBuf::from)),
        Some("repair") => Command::Repair(words.next().map(PathBuf::from)),
        Some(other) => {
            return Err(AppError::Config(format!("unknown command `{other}` (see --help)")));
        }
    };

    Ok(CliArgs { log_level, interactive, config_path, command })
}
