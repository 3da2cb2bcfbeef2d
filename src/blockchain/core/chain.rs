use crate::error::{ChainError, Result};
use crate::transaction::{Amount, Transaction};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::hashing::hash_block;
use super::validation::is_valid;

/// `previous_hash` of the genesis block. A sentinel, not a digest.
pub const GENESIS_PREVIOUS_HASH: &str = "1";
/// Seed proof of the genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// Seconds since the Unix epoch, with sub-second precision.
///
/// Kept as a JSON number for the same reason as [`Amount`]: peers may send
/// integer or fractional timestamps and both must re-encode unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(serde_json::Number);

impl Timestamp {
    pub fn now() -> Self {
        let micros = chrono::Utc::now().timestamp_micros();
        Self::from_secs_f64(micros as f64 / 1_000_000.0)
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Timestamp(serde_json::Number::from_f64(secs).unwrap_or_else(|| 0u64.into()))
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_f64().unwrap_or_default()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: Timestamp,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    pub fn hash(&self) -> String {
        hash_block(self)
    }
}

/// A full chain as exchanged between nodes: `{"chain": [...], "length": n}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl ChainSnapshot {
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len();
        ChainSnapshot { chain, length }
    }
}

/// The local ledger: an append-only chain plus the pool of transactions
/// waiting for the next block.
///
/// The chain is never empty. `new` seals the genesis block and
/// `replace_chain` refuses empty replacements.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
    pending_transactions: Vec<Transaction>,
}

impl Blockchain {
    /// Create a ledger holding only the genesis block.
    pub fn new() -> Self {
        let mut blockchain = Blockchain {
            blocks: Vec::new(),
            pending_transactions: Vec::new(),
        };
        blockchain.seal_block(GENESIS_PROOF, Some(GENESIS_PREVIOUS_HASH.to_string()));
        blockchain
    }

    /// Queue a transaction for the next block and return that block's index.
    pub fn new_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Amount>,
    ) -> u64 {
        let tx = Transaction::new(sender, recipient, amount);
        debug!(sender = %tx.sender, recipient = %tx.recipient, amount = %tx.amount, "ledger.transaction_queued");
        self.pending_transactions.push(tx);
        self.last_block().index + 1
    }

    /// Seal every pending transaction into a new block and append it.
    ///
    /// `previous_hash` defaults to the hash of the current head. The new
    /// block's timestamp is never earlier than its predecessor's.
    pub fn seal_block(&mut self, proof: u64, previous_hash: Option<String>) -> Block {
        let previous_hash = previous_hash
            .or_else(|| self.blocks.last().map(Block::hash))
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string());

        let mut timestamp = Timestamp::now();
        if let Some(last) = self.blocks.last() {
            if timestamp.as_secs_f64() < last.timestamp.as_secs_f64() {
                timestamp = last.timestamp.clone();
            }
        }

        let block = Block {
            index: self.blocks.len() as u64 + 1,
            timestamp,
            transactions: std::mem::take(&mut self.pending_transactions),
            proof,
            previous_hash,
        };

        self.blocks.push(block.clone());
        info!(
            index = block.index,
            proof = block.proof,
            transactions = block.transactions.len(),
            "ledger.block_sealed"
        );
        block
    }

    pub fn last_block(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn last_hash(&self) -> String {
        self.last_block().hash()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot::new(self.blocks.clone())
    }

    /// Certify the local chain with the default difficulty.
    pub fn is_valid(&self) -> bool {
        is_valid(&self.blocks)
    }

    /// Swap in a whole chain, as consensus resolution does. The pending pool
    /// is left untouched. Validity is the caller's responsibility.
    pub fn replace_chain(&mut self, chain: Vec<Block>) -> Result<()> {
        if chain.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        info!(old_length = self.blocks.len(), new_length = chain.len(), "ledger.chain_replaced");
        self.blocks = chain;
        Ok(())
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}
