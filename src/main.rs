use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use walletchat::agent::Orchestrator;
use walletchat::channels::ReplChannel;
use walletchat::cli::{Cli, Command};
use walletchat::config::Config;
use walletchat::relay::{RelayState, start_server};
use walletchat::session::{
    FileSessionStore, MemorySessionStore, SessionStore, get_or_create_session_id,
};
use walletchat::wallet::{JsonRpcWallet, WalletProvider};
use walletchat::workflow::HttpWorkflowClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.resolved_command();

    // The REPL owns stdout, so chat keeps logging quiet unless RUST_LOG says otherwise.
    let default_filter = match command {
        Command::Chat { .. } => "walletchat=warn",
        Command::Relay { .. } => "walletchat=info,tower_http=info",
    };
    init_tracing(default_filter, cli.wants_json_logs());

    let mut config = Config::from_env().context("failed to load configuration")?;

    match command {
        Command::Chat {
            message,
            session_file,
        } => {
            if session_file.is_some() {
                config.session.session_file = session_file;
            }
            run_chat(config, message).await
        }
        Command::Relay {
            host,
            port,
            backend,
        } => {
            if let Some(host) = host {
                config.relay.host = host;
            }
            if let Some(port) = port {
                config.relay.port = port;
            }
            if let Some(backend) = backend {
                config.relay.backend_url = backend;
            }
            run_relay(config).await
        }
    }
}

fn init_tracing(default_filter: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_chat(config: Config, message: Option<String>) -> anyhow::Result<()> {
    let store: Box<dyn SessionStore> = match &config.session.session_file {
        Some(path) => Box::new(FileSessionStore::new(path)),
        None => Box::new(MemorySessionStore::new()),
    };
    let session_id = get_or_create_session_id(store.as_ref());
    tracing::debug!(session_id = %session_id, "chat session ready");

    let workflow = Arc::new(HttpWorkflowClient::new(&config.workflow));
    let mut orchestrator =
        Orchestrator::new(session_id, workflow).with_native_symbol(config.native_symbol());

    match &config.wallet {
        Some(wallet_config) => {
            let wallet: Arc<dyn WalletProvider> = Arc::new(JsonRpcWallet::new(wallet_config));
            tracing::info!(address = %wallet.address(), "wallet connected");
            orchestrator = orchestrator.with_wallet(wallet);
        }
        None => tracing::info!("no wallet configured; balance and transfers are unavailable"),
    }

    let channel = match message {
        Some(message) => ReplChannel::with_message(message),
        None => ReplChannel::new(),
    };
    channel.run(&mut orchestrator).await?;
    Ok(())
}

async fn run_relay(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = tokio::net::lookup_host((config.relay.host.as_str(), config.relay.port))
        .await
        .with_context(|| format!("invalid relay host {}", config.relay.host))?
        .next()
        .with_context(|| format!("relay host {} did not resolve", config.relay.host))?;

    let state = Arc::new(RelayState::new(&config.relay)?);
    let handle = start_server(addr, state).await?;
    tracing::info!(
        backend = %config.relay.backend_url,
        prefix = config.relay.strip_prefix.as_deref().unwrap_or(""),
        "relay ready on {}",
        handle.local_addr()
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    handle.shutdown().await;
    Ok(())
}
