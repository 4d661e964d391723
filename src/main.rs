//! buidlbook-node: agent registry, balance-gated vote ledger, and
//! consensus API for the BuidlBook cohort
//!
//! Pseudo-autonomous agents (external callers) register a wallet, hold
//! enough $BOOK to stay active, and cast scored votes on submitted
//! projects. Per-project consensus is derived from vote dispersion on
//! every read. Every mutating operation leaves an activity trail.

mod activity;
mod api;
mod chain;
mod config;
mod consensus;
mod db;
mod error;
mod ledger;
mod policy;
mod registry;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use activity::ActivityRecorder;
use api::{create_router, AppState};
use chain::ChainOracle;
use config::Config;
use db::Db;
use ledger::VoteLedger;
use policy::EligibilityPolicy;
use registry::AgentRegistry;

#[derive(Parser)]
#[command(name = "buidlbook-node")]
#[command(about = "Agent registry and balance-gated vote ledger for BuidlBook")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "buidlbook-node.toml")]
    config: String,

    /// SQLite database path (overrides config file)
    #[arg(short, long, env = "BUIDLBOOK_DB")]
    database: Option<String>,

    /// HTTP port (overrides config file)
    #[arg(short, long, env = "BUIDLBOOK_PORT")]
    port: Option<u16>,

    /// Chain JSON-RPC endpoint (overrides config file)
    #[arg(long, env = "MONAD_RPC_URL")]
    rpc_url: Option<String>,

    /// $BOOK token contract address (overrides config file)
    #[arg(long, env = "BOOK_CONTRACT_ADDRESS")]
    token_contract: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("buidlbook_node=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    info!("Starting buidlbook-node");
    info!("Config file: {}", cli.config);

    // Load or create default config
    let mut config: Config = if std::path::Path::new(&cli.config).exists() {
        let content = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&content)?
    } else {
        info!("Config file not found, using defaults");
        Config::default()
    };

    // Apply CLI overrides
    if let Some(database) = cli.database {
        config.database.path = PathBuf::from(database);
    }
    if let Some(port) = cli.port {
        config.server.http_port = port;
    }
    if let Some(rpc_url) = cli.rpc_url {
        config.chain.rpc_url = rpc_url;
    }
    if let Some(token_contract) = cli.token_contract {
        config.chain.token_contract = token_contract;
    }

    info!("Database: {}", config.database.path.display());
    info!("Chain RPC: {}", config.chain.rpc_url);
    if config.chain.token_contract.is_empty() {
        info!("No token contract configured, running in mock mode");
    }
    info!(
        "Eligibility threshold: {} $BOOK",
        config.policy.balance_threshold
    );

    // Wire up the components: one immutable config, passed explicitly
    let db = Arc::new(Db::open(&config.database.path)?);
    let eligibility =
        EligibilityPolicy::from_config(&config.policy, &config.chain.admin_wallets);
    let oracle = Arc::new(ChainOracle::new(config.chain.clone(), eligibility.clone()));
    let recorder = ActivityRecorder::new(db.clone());
    let agent_registry = AgentRegistry::new(
        db.clone(),
        oracle.clone(),
        eligibility.clone(),
        recorder.clone(),
    );
    let vote_ledger = VoteLedger::new(
        db.clone(),
        oracle,
        eligibility,
        agent_registry.clone(),
        recorder.clone(),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        registry: agent_registry,
        ledger: vote_ledger,
        activity: recorder,
    });

    let app = create_router(state);

    // Bind to HTTP port
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.http_port)
        .parse()?;
    info!("API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
