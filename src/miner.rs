//! Proof-of-work mining
//!
//! The puzzle for the block after `B` is a number `p` such that
//! `SHA-256("{B.proof}{p}{hash(B)}")`, rendered as hex, starts with
//! `difficulty` zero characters. Solutions are found by a linear scan from
//! zero, so the result is always the smallest valid proof.

use crate::blockchain::Block;
use crate::error::{ChainError, Result};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Leading zero hex characters required of a valid proof.
pub const DEFAULT_DIFFICULTY: usize = 4;

/// A SHA-256 digest has 64 hex characters.
pub const MAX_DIFFICULTY: usize = 64;

/// Attempts between checks of the cancellation flag.
pub const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// Whether `proof` solves the puzzle for a block whose predecessor has
/// `last_proof` and `last_hash`, at the default difficulty.
pub fn valid_proof(last_proof: u64, proof: u64, last_hash: &str) -> bool {
    ProofOfWork::default().valid_proof(last_proof, proof, last_hash)
}

/// Smallest proof solving the puzzle for `(last_proof, last_hash)` at the
/// default difficulty.
pub fn proof_of_work(last_proof: u64, last_hash: &str) -> u64 {
    ProofOfWork::default().search(last_proof, last_hash)
}

/// True when the hex rendering of `digest` starts with `zeros` '0' characters.
fn has_zero_prefix(digest: &[u8], zeros: usize) -> bool {
    if zeros > digest.len() * 2 {
        return false;
    }
    let full_bytes = zeros / 2;
    digest[..full_bytes].iter().all(|b| *b == 0) && (zeros % 2 == 0 || digest[full_bytes] >> 4 == 0)
}

/// The proof-of-work engine. The difficulty is fixed for the engine's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        ProofOfWork {
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Result<Self> {
        if difficulty == 0 || difficulty > MAX_DIFFICULTY {
            return Err(ChainError::Config(format!(
                "Difficulty must be between 1 and {}, got {}",
                MAX_DIFFICULTY, difficulty
            )));
        }
        Ok(ProofOfWork { difficulty })
    }

    /// Unchecked constructor for verification. A difficulty above
    /// [`MAX_DIFFICULTY`] accepts no proof at all.
    pub fn with_difficulty(difficulty: usize) -> Self {
        ProofOfWork { difficulty }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn valid_proof(&self, last_proof: u64, proof: u64, last_hash: &str) -> bool {
        let guess = format!("{}{}{}", last_proof, proof, last_hash);
        let guess_hash = Sha256::digest(guess.as_bytes());
        has_zero_prefix(&guess_hash, self.difficulty)
    }

    /// Scan upward from zero until a proof is found. Unbounded.
    pub fn search(&self, last_proof: u64, last_hash: &str) -> u64 {
        let mut proof = 0;
        while !self.valid_proof(last_proof, proof, last_hash) {
            proof += 1;
        }
        proof
    }

    /// The proof for the block that will follow `last_block`.
    pub fn proof_of_work(&self, last_block: &Block) -> u64 {
        self.search(last_block.proof, &last_block.hash())
    }

    /// Like [`ProofOfWork::search`], but gives up with
    /// [`ChainError::MiningCancelled`] once `cancel` is raised.
    pub fn search_cancellable(&self, last_proof: u64, last_hash: &str, cancel: &AtomicBool) -> Result<u64> {
        let mut proof = 0;
        loop {
            if self.valid_proof(last_proof, proof, last_hash) {
                return Ok(proof);
            }
            proof += 1;
            if proof % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                debug!(attempts = proof, "mining.cancelled");
                return Err(ChainError::MiningCancelled);
            }
        }
    }

    /// Run the search on tokio's blocking pool. The worker reads nothing but
    /// its arguments, so it can be abandoned at any time without touching
    /// ledger state.
    pub fn spawn_search(&self, last_proof: u64, last_hash: String) -> MiningJob {
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let engine = *self;
        let started = Instant::now();

        let handle = tokio::task::spawn_blocking(move || -> Result<u64> {
            let found = engine.search_cancellable(last_proof, &last_hash, &flag)?;
            info!(
                proof = found,
                difficulty = engine.difficulty,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "mining.proof_found"
            );
            Ok(found)
        });

        MiningJob { cancel, handle }
    }
}

/// A proof search running in the background. Dropping the job stops the
/// worker.
pub struct MiningJob {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<Result<u64>>,
}

impl MiningJob {
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Wait for the proof. With a deadline, an unfinished search is stopped
    /// and reported as [`ChainError::MiningTimeout`].
    pub async fn wait(mut self, deadline: Option<Duration>) -> Result<u64> {
        let joined = match deadline {
            Some(limit) => match tokio::time::timeout(limit, &mut self.handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    self.cancel();
                    return Err(ChainError::MiningTimeout(limit));
                }
            },
            None => (&mut self.handle).await,
        };

        match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => Err(ChainError::MiningCancelled),
            Err(e) => Err(ChainError::Io(format!("Mining worker failed: {}", e))),
        }
    }
}

impl Drop for MiningJob {
    fn drop(&mut self) {
        self.cancel();
    }
}
