#![forbid(unsafe_code)]
//! Mine blocks on a fresh in-memory ledger and report timings.

use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use proofchain::logging::init_logging;
use proofchain::blockchain::{validate_chain, Blockchain};
use proofchain::miner::{ProofOfWork, DEFAULT_DIFFICULTY};
use proofchain::node::generate_identity;
use proofchain::transaction::{MINING_REWARD, REWARD_SENDER};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of leading zero hex digits a proof must produce
    #[arg(short, long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: usize,
    /// How many blocks to mine
    #[arg(short, long, default_value_t = 1)]
    blocks: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging("warn");
    let pow = ProofOfWork::new(cli.difficulty)?;
    let identity = generate_identity();
    let mut blockchain = Blockchain::new();

    println!(
        "{} {} block(s) at difficulty {} for {}\n",
        "⛏️  Mining".bright_cyan().bold(),
        cli.blocks,
        cli.difficulty,
        identity.yellow()
    );

    let started = Instant::now();
    for _ in 0..cli.blocks {
        let last = blockchain.last_block();
        let next_index = last.index + 1;

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")?);
        spinner.set_message(format!("searching proof for block #{}", next_index));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let block_started = Instant::now();
        let proof = pow.spawn_search(last.proof, last.hash()).wait(None).await?;
        let elapsed = block_started.elapsed();

        blockchain.new_transaction(REWARD_SENDER, identity.clone(), MINING_REWARD);
        let block = blockchain.seal_block(proof, None);
        spinner.finish_and_clear();

        println!(
            "{} #{:<4} proof {:<10} in {}",
            "✅ Block".green(),
            block.index,
            block.proof,
            humantime::format_duration(truncate_to_millis(elapsed))
        );
        println!("   {} {}", "hash:".dimmed(), block.hash().dimmed());
    }

    let total = started.elapsed();
    println!();
    println!(
        "{} {} blocks, {} total",
        "📊 Chain:".bright_blue().bold(),
        blockchain.len(),
        humantime::format_duration(truncate_to_millis(total))
    );

    match validate_chain(blockchain.blocks(), pow.difficulty()) {
        Ok(()) => println!("{}", "🔒 Chain is valid".green().bold()),
        Err(e) => println!("{} {}", "❌ Chain is invalid:".red().bold(), e),
    }

    Ok(())
}

fn truncate_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}
