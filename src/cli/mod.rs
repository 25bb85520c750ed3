//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "walletchat",
    about = "Chat with an automation workflow that operates your EVM wallet",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the chat REPL (default)
    Chat {
        /// Send a single message and exit
        #[arg(short, long)]
        message: Option<String>,

        /// Keep the session id in this file across runs
        #[arg(long, env = "CHAT_SESSION_FILE")]
        session_file: Option<PathBuf>,
    },

    /// Run the workflow relay
    Relay {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Backend base URL requests are forwarded to
        #[arg(long)]
        backend: Option<String>,
    },
}

impl Cli {
    /// Subcommand to run; bare `walletchat` starts the chat.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat {
            message: None,
            session_file: None,
        })
    }

    /// JSON logs requested by flag or `LOG_FORMAT=json`.
    pub fn wants_json_logs(&self) -> bool {
        self.log_json
            || std::env::var("LOG_FORMAT")
                .map(|v| v.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
    }
}
