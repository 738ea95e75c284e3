//! PTY (console) comms channel — reads questions from stdin and prints the
//! answers to stdout.
//!
//! A plain line is answered from the FAQ knowledge base. Lines starting with
//! a slash are console commands:
//!
//! ```text
//! /rag <question>   answer from the indexed documents
//! /stats            knowledge-base and index counters
//! /help             this list
//! /quit             leave the console
//! ```
//!
//! Runs until the `shutdown` token is cancelled (Ctrl-C), stdin is closed,
//! or the user quits.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::subsystems::runtime::{Component, ComponentFuture};

use super::state::{CommsEvent, CommsState};

const HELP: &str = "\
  <question>        ask the FAQ knowledge base
  /rag <question>   ask the document assistant
  /stats            show knowledge counters
  /help             show this list
  /quit             leave";

// ── Command parsing ───────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Faq(&'a str),
    Rag(&'a str),
    Stats,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse(line: &str) -> Option<Command<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Faq(line));
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    Some(match name {
        "rag" if !arg.is_empty() => Command::Rag(arg),
        "stats" => Command::Stats,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(line),
    })
}

// ── PtyChannel ───────────────────────────────────────────────────────────────

/// A console channel instance.
pub struct PtyChannel {
    channel_id: String,
    state: Arc<CommsState>,
}

impl PtyChannel {
    pub fn new(channel_id: impl Into<String>, state: Arc<CommsState>) -> Self {
        Self { channel_id: channel_id.into(), state }
    }
}

impl Component for PtyChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_pty(self.channel_id, self.state, shutdown))
    }
}

// ── run_pty ──────────────────────────────────────────────────────────────────

async fn run_pty(
    channel_id: String,
    state: Arc<CommsState>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    info!(%channel_id, "pty channel started");
    println!("─────────────────────────────────");
    println!(" SmartQA console  (/help, Ctrl-C to quit)");
    println!("─────────────────────────────────");
    state.report_event(CommsEvent::SessionStarted { channel_id: channel_id.clone() });

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        print!("> ");
        use std::io::Write as _;
        let _ = std::io::stdout().flush();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!();
                info!("pty channel shutting down");
                break;
            }

            line = lines.next_line() => {
                let input = match line {
                    Err(e) => {
                        warn!("pty read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!("pty stdin closed");
                        break;
                    }
                    Ok(Some(input)) => input,
                };
                let Some(command) = parse(&input) else { continue };
                debug!(?command, "pty received line");

                match command {
                    Command::Quit => break,
                    Command::Help => println!("{HELP}"),
                    Command::Unknown(line) => println!("unknown command: {line}  (try /help)"),
                    Command::Stats => {
                        let faq = state.faq_stats();
                        let rag = state.knowledge_stats().await;
                        println!(
                            "faq records: {}  categories: {}  indexed paragraphs: {}",
                            faq.records,
                            faq.categories.len(),
                            rag.count
                        );
                    }
                    Command::Faq(q) => match state.ask_faq(&channel_id, q.to_string()).await {
                        Ok(answer) => println!("{}", answer.text),
                        Err(e) => warn!("faq error: {e}"),
                    },
                    Command::Rag(q) => match state.ask_rag(&channel_id, q, None).await {
                        Ok(answer) => println!("{}", answer.answer),
                        Err(e) => warn!("rag error: {e}"),
                    },
                }
            }
        }
    }

    state.report_event(CommsEvent::ChannelShutdown { channel_id });
    Ok(())
}
