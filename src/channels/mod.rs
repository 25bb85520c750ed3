//! User-facing channels.

mod repl;

pub use repl::{ReplChannel, ReplCommand, parse_command};
