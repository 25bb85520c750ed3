//! Interactive chat REPL.
//!
//! Uses rustyline for line editing, history, and tab-completion. Input is
//! read on a dedicated thread; the next prompt is only shown once the
//! previous turn has been answered, so a message can never be submitted
//! twice while a request is in flight.
//!
//! ## Commands
//!
//! - `/help` - Show available commands
//! - `/session` - Print the conversation session id
//! - `/quit` or `/exit` - Exit the REPL

use std::borrow::Cow;
use std::sync::mpsc as std_mpsc;

use rustyline::completion::Completer;
use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Editor, Helper};
use tokio::sync::mpsc;

use crate::agent::{Orchestrator, render_paragraphs};
use crate::error::Error;

/// Slash commands available in the REPL.
const SLASH_COMMANDS: &[&str] = &["/help", "/session", "/quit", "/exit"];

/// Commands handled by the REPL itself rather than sent as chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Session,
    Quit,
}

/// Recognize a local command. Matching is case-insensitive.
pub fn parse_command(line: &str) -> Option<ReplCommand> {
    match line.trim().to_lowercase().as_str() {
        "/help" => Some(ReplCommand::Help),
        "/session" => Some(ReplCommand::Session),
        "/quit" | "/exit" => Some(ReplCommand::Quit),
        _ => None,
    }
}

/// Rustyline helper for slash-command tab completion.
struct ReplHelper;

impl Completer for ReplHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        Ok((0, complete_command(&line[..pos])))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        hint_command(line)
    }
}

impl Highlighter for ReplHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[90m{hint}\x1b[0m"))
    }
}

impl Validator for ReplHelper {}
impl Helper for ReplHelper {}

fn complete_command(prefix: &str) -> Vec<String> {
    if !prefix.starts_with('/') {
        return vec![];
    }
    SLASH_COMMANDS
        .iter()
        .filter(|cmd| cmd.starts_with(prefix))
        .map(|cmd| cmd.to_string())
        .collect()
}

fn hint_command(line: &str) -> Option<String> {
    if !line.starts_with('/') {
        return None;
    }
    SLASH_COMMANDS
        .iter()
        .find(|cmd| cmd.starts_with(line) && **cmd != line)
        .map(|cmd| cmd[line.len()..].to_string())
}

fn print_help() {
    let h = "\x1b[1m"; // bold (section headers)
    let c = "\x1b[1;36m"; // bold cyan (commands)
    let d = "\x1b[90m"; // dim gray (descriptions)
    let r = "\x1b[0m"; // reset

    println!();
    println!("  {h}walletchat{r}");
    println!();
    println!("  {h}Commands{r}");
    println!("  {c}/help{r}              {d}show this help{r}");
    println!("  {c}/session{r}           {d}print the session id{r}");
    println!("  {c}/quit{r} {c}/exit{r}        {d}exit the repl{r}");
    println!();
    println!("  {h}Wallet{r}");
    println!("  {d}Ask for your balance, or ask to send funds and answer the prompts.{r}");
    println!("  {d}Pasting a 0x... address starts a transfer to that address.{r}");
    println!();
}

/// Print an assistant reply as paragraphs under a dim separator.
fn print_reply(reply: &str) {
    let width = crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(80);
    let sep_width = width.min(80);
    eprintln!("\x1b[90m{}\x1b[0m", "\u{2500}".repeat(sep_width));

    for paragraph in render_paragraphs(reply) {
        println!("{paragraph}");
    }
    println!();
}

/// Chat REPL bound to one orchestrator.
pub struct ReplChannel {
    /// Optional single message to send (for -m flag).
    single_message: Option<String>,
}

impl ReplChannel {
    /// Create an interactive REPL.
    pub fn new() -> Self {
        Self {
            single_message: None,
        }
    }

    /// Create a REPL that sends a single message and exits.
    pub fn with_message(message: String) -> Self {
        Self {
            single_message: Some(message),
        }
    }

    /// Drive the conversation until the user quits or input ends.
    pub async fn run(self, orchestrator: &mut Orchestrator) -> Result<(), Error> {
        if let Some(message) = self.single_message {
            if let Some(reply) = orchestrator.handle_input(&message).await {
                print_reply(&reply);
            }
            return Ok(());
        }

        let (line_tx, mut line_rx) = mpsc::channel::<String>(1);
        let (ack_tx, ack_rx) = std_mpsc::channel::<()>();
        let session_id = orchestrator.session_id().to_string();

        let input_thread = std::thread::spawn(move || {
            read_lines(line_tx, ack_rx, session_id);
        });

        while let Some(line) = line_rx.recv().await {
            if let Some(reply) = orchestrator.handle_input(&line).await {
                print_reply(&reply);
            }
            if ack_tx.send(()).is_err() {
                break;
            }
        }

        drop(ack_tx);
        input_thread
            .join()
            .map_err(|_| Error::Terminal("input thread panicked".to_string()))?;
        Ok(())
    }
}

impl Default for ReplChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Input loop run on its own thread. Each chat line is sent to the turn
/// loop, then the thread waits for the turn to finish before prompting again.
fn read_lines(line_tx: mpsc::Sender<String>, ack_rx: std_mpsc::Receiver<()>, session_id: String) {
    let config = match Config::builder().history_ignore_dups(true) {
        Ok(builder) => builder
            .auto_add_history(true)
            .completion_type(CompletionType::List)
            .build(),
        Err(e) => {
            eprintln!("Failed to configure line editor: {e}");
            return;
        }
    };

    let mut rl = match Editor::with_config(config) {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Failed to initialize line editor: {e}");
            return;
        }
    };

    rl.set_helper(Some(ReplHelper));

    let hist_path = crate::bootstrap::history_path();
    if let Some(parent) = hist_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = rl.load_history(&hist_path);

    println!("\x1b[1mwalletchat\x1b[0m  /help for commands, /quit to exit");
    println!();

    loop {
        match rl.readline("\x1b[1;36m\u{203A}\x1b[0m ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match parse_command(line) {
                    Some(ReplCommand::Quit) => break,
                    Some(ReplCommand::Help) => {
                        print_help();
                        continue;
                    }
                    Some(ReplCommand::Session) => {
                        println!("\x1b[90msession\x1b[0m {session_id}");
                        continue;
                    }
                    None => {}
                }

                if line_tx.blocking_send(line.to_string()).is_err() {
                    break;
                }
                if ack_rx.recv().is_err() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("\x1b[90m(use /quit to exit)\x1b[0m");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(&hist_path) {
        tracing::debug!("Failed to save history: {}", e);
    }
}
