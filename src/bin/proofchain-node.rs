#![forbid(unsafe_code)]
//! Run a proofchain node: the ledger, its peers and the HTTP API.

use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use proofchain::api::run_api_server;
use proofchain::config::{load_config_from, DEFAULT_CONFIG_PATH};
use proofchain::logging::init_logging;
use proofchain::node::Node;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Port to listen on, overriding network.api_port
    #[arg(short, long)]
    port: Option<u16>,
    /// Peer to register at startup (repeatable)
    #[arg(long = "peer")]
    peers: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config_from(&cli.config)?;
    if let Some(port) = cli.port {
        config.network.api_port = port;
    }
    config.validate()?;
    init_logging(&config.logging.level);

    let node = Node::from_config(&config)?;
    for peer in config.network.bootstrap_peers.iter().chain(cli.peers.iter()) {
        node.register_peer(peer).await?;
    }

    println!("{}", "⛓️  proofchain node".bright_cyan().bold());
    println!("   {} {}", "Identity:".bright_white(), node.identity().yellow());
    println!("   {} {}", "Difficulty:".bright_white(), node.difficulty());
    println!(
        "   {} http://{}:{}",
        "Listening:".bright_white(),
        config.network.host,
        config.network.api_port
    );
    let peers = node.peers().await;
    if !peers.is_empty() {
        println!("   {} {}", "Peers:".bright_white(), peers.join(", "));
    }
    println!();

    run_api_server(Arc::new(node), &config.network.host, config.network.api_port).await
}
