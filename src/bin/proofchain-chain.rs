#![forbid(unsafe_code)]
//! Fetch a peer's chain, validate it and print it as a table.

use clap::Parser;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use proofchain::logging::init_logging;
use proofchain::blockchain::validate_chain;
use proofchain::miner::DEFAULT_DIFFICULTY;
use proofchain::network::{ChainFetcher, HttpChainFetcher, DEFAULT_PEER_TIMEOUT};
use proofchain::peers::normalize_address;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Peer address, with or without scheme
    peer: String,
    /// Difficulty to validate the chain at
    #[arg(short, long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging("warn");
    let peer = normalize_address(&cli.peer)?;

    let fetcher = HttpChainFetcher::new(DEFAULT_PEER_TIMEOUT)?;
    let snapshot = fetcher.fetch_chain(&peer).await?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Index").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Timestamp").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Txs").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Proof").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Previous Hash").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
        ]);

    for block in &snapshot.chain {
        table.add_row(vec![
            Cell::new(format!("#{}", block.index)).fg(TableColor::White),
            Cell::new(block.timestamp.to_string()).fg(TableColor::Grey),
            Cell::new(block.transactions.len()).fg(TableColor::White),
            Cell::new(block.proof).fg(TableColor::Yellow),
            Cell::new(&block.previous_hash).fg(TableColor::Grey),
        ]);
    }

    println!("{} {}", "⛓️  Chain from".bright_cyan().bold(), peer.bright_white());
    println!("{}", table);
    println!("   {} {}", "Reported length:".bright_white(), snapshot.length);

    if snapshot.length != snapshot.chain.len() {
        println!(
            "{} reported {} but sent {} blocks",
            "⚠️  Length mismatch:".yellow().bold(),
            snapshot.length,
            snapshot.chain.len()
        );
    }

    match validate_chain(&snapshot.chain, cli.difficulty) {
        Ok(()) => println!("{}", "🔒 Chain is valid".green().bold()),
        Err(e) => println!("{} {}", "❌ Chain is invalid:".red().bold(), e),
    }

    Ok(())
}
