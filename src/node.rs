use crate::blockchain::{Block, Blockchain, ChainSnapshot};
use crate::config::Config;
use crate::consensus::ConsensusResolver;
use crate::error::{ChainError, Result};
use crate::miner::ProofOfWork;
use crate::network::{ChainFetcher, HttpChainFetcher};
use crate::peers::PeerSet;
use crate::transaction::{Amount, MINING_REWARD, REWARD_SENDER};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// A random 128-bit node identity rendered as 32 lowercase hex characters.
pub fn generate_identity() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// One ledger node: the chain, its peers, and the operations the transport
/// layer exposes.
///
/// The ledger and the peer set sit behind their own locks. Mining holds no
/// lock while searching for a proof.
pub struct Node<F: ChainFetcher = HttpChainFetcher> {
    pub blockchain: Arc<RwLock<Blockchain>>,
    pub peers: Arc<RwLock<PeerSet>>,
    identity: String,
    pow: ProofOfWork,
    mining_timeout: Option<Duration>,
    resolver: ConsensusResolver<F>,
}

impl Node<HttpChainFetcher> {
    /// Build a node from configuration, talking to peers over HTTP.
    pub fn from_config(config: &Config) -> Result<Self> {
        let pow = ProofOfWork::new(config.miner.difficulty)?;
        let fetcher = HttpChainFetcher::new(config.peer_timeout())?;
        let identity = config.miner.identity.clone().unwrap_or_else(generate_identity);

        let mut node = Node::new(identity, pow, fetcher);
        node.mining_timeout = config.mining_timeout();
        Ok(node)
    }
}

impl<F: ChainFetcher> Node<F> {
    pub fn new(identity: String, pow: ProofOfWork, fetcher: F) -> Self {
        let resolver = ConsensusResolver::new(fetcher, pow.difficulty());
        Node {
            blockchain: Arc::new(RwLock::new(Blockchain::new())),
            peers: Arc::new(RwLock::new(PeerSet::new())),
            identity,
            pow,
            mining_timeout: None,
            resolver,
        }
    }

    /// Give up on a block whose proof takes longer than `timeout`.
    pub fn with_mining_timeout(mut self, timeout: Duration) -> Self {
        self.mining_timeout = Some(timeout);
        self
    }

    /// Bound each peer fetch during consensus resolution.
    pub fn with_peer_timeout(mut self, timeout: Duration) -> Self {
        self.resolver = self.resolver.with_peer_timeout(timeout);
        self
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn difficulty(&self) -> usize {
        self.pow.difficulty()
    }

    pub fn fetcher(&self) -> &F {
        self.resolver.fetcher()
    }

    /// Queue a transaction. Returns the index of the block that will hold it.
    pub async fn submit_transaction(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Amount>,
    ) -> u64 {
        self.blockchain.write().await.new_transaction(sender, recipient, amount)
    }

    /// Find a proof for the current head, pay the mining reward to this
    /// node's identity and seal the pending pool into a new block.
    ///
    /// If the head moves while the search runs (another block was sealed or
    /// consensus replaced the chain) the proof is stale and the search starts
    /// over against the new head.
    pub async fn mine_block(&self) -> Result<Block> {
        // A limit too far out to represent as an Instant is no limit at all.
        let deadline = self
            .mining_timeout
            .and_then(|limit| Instant::now().checked_add(limit).map(|at| (limit, at)));

        loop {
            let (last_proof, last_hash) = {
                let blockchain = self.blockchain.read().await;
                let last = blockchain.last_block();
                (last.proof, last.hash())
            };

            let remaining = match deadline {
                Some((limit, at)) => {
                    let left = at.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return Err(ChainError::MiningTimeout(limit));
                    }
                    Some(left)
                }
                None => None,
            };

            let proof = self
                .pow
                .spawn_search(last_proof, last_hash.clone())
                .wait(remaining)
                .await
                .map_err(|e| match (e, deadline) {
                    (ChainError::MiningTimeout(_), Some((limit, _))) => ChainError::MiningTimeout(limit),
                    (other, _) => other,
                })?;

            let mut blockchain = self.blockchain.write().await;
            if blockchain.last_hash() != last_hash {
                warn!(proof, "mining.stale_head");
                continue;
            }

            blockchain.new_transaction(REWARD_SENDER, self.identity.clone(), MINING_REWARD);
            let block = blockchain.seal_block(proof, Some(last_hash));
            info!(index = block.index, proof = block.proof, "mining.block_forged");
            return Ok(block);
        }
    }

    pub async fn get_chain(&self) -> ChainSnapshot {
        self.blockchain.read().await.snapshot()
    }

    /// Register a peer. Returns whether it was new.
    pub async fn register_peer(&self, address: &str) -> Result<bool> {
        self.peers.write().await.register(address)
    }

    pub async fn peers(&self) -> Vec<String> {
        self.peers.read().await.addresses()
    }

    /// Adopt the longest valid peer chain if it beats the local one.
    pub async fn resolve_conflicts(&self) -> Result<bool> {
        self.resolver.resolve_conflicts(&self.blockchain, &self.peers).await
    }
}
