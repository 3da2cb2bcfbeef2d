//! Longest-valid-chain consensus
//!
//! Every registered peer is asked for its chain. Among the chains that are
//! strictly longer than the local one and pass validation, the last one to
//! beat the running maximum is adopted. Length is the only ranking
//! criterion; a tie never replaces the local chain.

use crate::blockchain::{validate_chain, Block, Blockchain, ChainSnapshot};
use crate::error::{ChainError, Result};
use crate::network::ChainFetcher;
use crate::peers::PeerSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// A peer chain chosen for adoption.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub peer: String,
    pub chain: Vec<Block>,
}

/// Pick the chain to adopt from fetched snapshots, in the order given.
///
/// A snapshot must be strictly longer than everything seen so far (starting
/// at `local_length`), report a `length` matching the chain it carries, and
/// validate at `difficulty`. Returns `None` when the local chain stands.
pub fn select_longest_valid(
    local_length: usize,
    snapshots: impl IntoIterator<Item = (String, ChainSnapshot)>,
    difficulty: usize,
) -> Option<Candidate> {
    let mut max_length = local_length;
    let mut best = None;

    for (peer, snapshot) in snapshots {
        if snapshot.length != snapshot.chain.len() {
            warn!(
                peer = %peer,
                reported = snapshot.length,
                actual = snapshot.chain.len(),
                "consensus.length_mismatch"
            );
            continue;
        }
        if snapshot.length <= max_length {
            debug!(peer = %peer, length = snapshot.length, max_length, "consensus.not_longer");
            continue;
        }
        match validate_chain(&snapshot.chain, difficulty) {
            Ok(()) => {
                max_length = snapshot.length;
                best = Some(Candidate {
                    peer,
                    chain: snapshot.chain,
                });
            }
            Err(e) => warn!(peer = %peer, error = %e, "consensus.invalid_chain"),
        }
    }

    best
}

/// Resolves conflicts between the local ledger and its peers.
pub struct ConsensusResolver<F: ChainFetcher> {
    fetcher: Arc<F>,
    difficulty: usize,
    peer_timeout: Option<Duration>,
}

impl<F: ChainFetcher> ConsensusResolver<F> {
    pub fn new(fetcher: F, difficulty: usize) -> Self {
        ConsensusResolver {
            fetcher: Arc::new(fetcher),
            difficulty,
            peer_timeout: None,
        }
    }

    /// Bound every peer fetch, on top of whatever the fetcher enforces.
    pub fn with_peer_timeout(mut self, timeout: Duration) -> Self {
        self.peer_timeout = Some(timeout);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch every peer's chain concurrently. Peers that fail are logged and
    /// left out. Results come back sorted by peer address.
    pub async fn collect_snapshots(&self, peers: Vec<String>) -> Vec<(String, ChainSnapshot)> {
        let mut tasks = JoinSet::new();

        for peer in peers {
            let fetcher = Arc::clone(&self.fetcher);
            let peer_timeout = self.peer_timeout;
            tasks.spawn(async move {
                let fetched = match peer_timeout {
                    Some(limit) => tokio::time::timeout(limit, fetcher.fetch_chain(&peer))
                        .await
                        .unwrap_or_else(|_| {
                            Err(ChainError::PeerUnreachable {
                                peer: peer.clone(),
                                reason: format!("No response within {:?}", limit),
                            })
                        }),
                    None => fetcher.fetch_chain(&peer).await,
                };
                (peer, fetched)
            });
        }

        let mut snapshots = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((peer, Ok(snapshot))) => snapshots.push((peer, snapshot)),
                Ok((peer, Err(e))) => warn!(peer = %peer, error = %e, "consensus.peer_skipped"),
                Err(e) => warn!(error = %e, "consensus.fetch_task_failed"),
            }
        }
        snapshots.sort_by(|a, b| a.0.cmp(&b.0));
        snapshots
    }

    /// Replace the local chain with the longest valid peer chain, if one is
    /// longer. Returns whether the chain was replaced.
    ///
    /// No lock is held while peers are contacted. The replacement itself is
    /// a compare-and-swap: the candidate is adopted only if it is still
    /// longer than the chain found under the write lock.
    pub async fn resolve_conflicts(&self, blockchain: &RwLock<Blockchain>, peers: &RwLock<PeerSet>) -> Result<bool> {
        let peers = peers.read().await.addresses();
        let local_length = blockchain.read().await.len();
        info!(peers = peers.len(), local_length, "consensus.resolve_started");

        let snapshots = self.collect_snapshots(peers).await;
        // Validation re-hashes every block of every candidate.
        let difficulty = self.difficulty;
        let selected =
            tokio::task::spawn_blocking(move || select_longest_valid(local_length, snapshots, difficulty))
                .await
                .map_err(|e| ChainError::Io(format!("Chain validation worker failed: {}", e)))?;
        let Some(candidate) = selected else {
            info!(local_length, "consensus.local_chain_authoritative");
            return Ok(false);
        };

        let mut blockchain = blockchain.write().await;
        if candidate.chain.len() <= blockchain.len() {
            info!(
                peer = %candidate.peer,
                candidate_length = candidate.chain.len(),
                local_length = blockchain.len(),
                "consensus.candidate_outgrown"
            );
            return Ok(false);
        }

        let new_length = candidate.chain.len();
        blockchain.replace_chain(candidate.chain)?;
        info!(peer = %candidate.peer, new_length, "consensus.chain_replaced");
        Ok(true)
    }
}
