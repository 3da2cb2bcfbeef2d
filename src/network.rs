//! Fetching chains from peer nodes
//!
//! Consensus resolution only sees the [`ChainFetcher`] trait. The HTTP
//! implementation talks to a peer's `GET /chain` endpoint; the in-memory one
//! serves canned snapshots for local networks and tests.

use crate::blockchain::ChainSnapshot;
use crate::error::{ChainError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default per-request timeout for peer fetches.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of peer chains. A failure is reported per peer and never aborts
/// the evaluation of other peers.
pub trait ChainFetcher: Send + Sync + 'static {
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = Result<ChainSnapshot>> + Send;
}

/// Fetches `http://{peer}/chain`.
#[derive(Debug, Clone)]
pub struct HttpChainFetcher {
    client: reqwest::Client,
}

impl HttpChainFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(HttpChainFetcher { client })
    }

    pub fn chain_url(peer: &str) -> String {
        format!("http://{}/chain", peer)
    }
}

impl ChainFetcher for HttpChainFetcher {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot> {
        let unreachable = |reason: String| ChainError::PeerUnreachable {
            peer: peer.to_string(),
            reason,
        };

        let url = Self::chain_url(peer);
        debug!(%url, "network.fetch_chain");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unreachable(format!("HTTP status {}", status)));
        }

        response
            .json::<ChainSnapshot>()
            .await
            .map_err(|e| unreachable(format!("Malformed chain response: {}", e)))
    }
}

/// Serves snapshots from memory. Peers without an entry are unreachable.
#[derive(Debug, Default)]
pub struct InMemoryChainFetcher {
    chains: RwLock<HashMap<String, ChainSnapshot>>,
}

impl InMemoryChainFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, peer: impl Into<String>, snapshot: ChainSnapshot) {
        self.chains.write().insert(peer.into(), snapshot);
    }

    pub fn remove(&self, peer: &str) -> Option<ChainSnapshot> {
        self.chains.write().remove(peer)
    }
}

impl ChainFetcher for InMemoryChainFetcher {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot> {
        self.chains
            .read()
            .get(peer)
            .cloned()
            .ok_or_else(|| ChainError::PeerUnreachable {
                peer: peer.to_string(),
                reason: "No such peer".to_string(),
            })
    }
}
