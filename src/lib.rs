//! walletchat: a chat front end that operates an EVM wallet through a remote
//! automation workflow.
//!
//! User text goes to the workflow webhook tagged with a per-session id. The
//! workflow answers with text or with an instruction (`check_balance`, or a
//! send/transfer request); instructions run against the connected wallet.
//! Transfers collect the recipient and amount locally before anything is
//! submitted.

pub mod agent;
pub mod bootstrap;
pub mod channels;
pub mod cli;
pub mod config;
pub mod error;
pub mod relay;
pub mod session;
pub mod wallet;
pub mod workflow;

pub use agent::Orchestrator;
pub use config::Config;
pub use error::{Error, Result};
pub use session::{SessionId, get_or_create_session_id};
