#![forbid(unsafe_code)]

use colored::*;

fn main() {
    println!("{}", "proofchain CLI".bright_cyan().bold());
    println!("{}", "--------------".bright_cyan());
    println!();
    println!(
        "{}",
        "This is the main entry point, but most functionality is in separate binaries.".yellow()
    );
    println!(
        "{}",
        "Use 'cargo run --bin <binary_name>' to run a specific command.".yellow()
    );
    println!();
    println!("{}", "Available binaries:".bright_green().underline());
    println!(
        "  - {}  {}",
        "proofchain-node".bright_white(),
        "run a node with the HTTP API".dimmed()
    );
    println!(
        "  - {}  {}",
        "proofchain-mine-block".bright_white(),
        "mine blocks on a local, in-memory ledger".dimmed()
    );
    println!(
        "  - {}  {}",
        "proofchain-chain".bright_white(),
        "fetch, validate and print a peer's chain".dimmed()
    );
    println!();
    println!("{}", "Example:".bright_green().underline());
    println!("{}", "  cargo run --bin proofchain-node -- --port 5001 --peer 127.0.0.1:5000".italic());
}
