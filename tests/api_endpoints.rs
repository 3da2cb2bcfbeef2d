//! Integration tests for the proofchain HTTP API
//!
//! Nodes here use the in-memory fetcher and a low difficulty so mining
//! finishes quickly.

use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use proofchain::api::build_api_router;
use proofchain::blockchain::{validate_chain, Block, Blockchain};
use proofchain::miner::ProofOfWork;
use proofchain::network::InMemoryChainFetcher;
use proofchain::node::Node;

const TEST_DIFFICULTY: usize = 2;

fn test_node(identity: &str) -> Arc<Node<InMemoryChainFetcher>> {
    Arc::new(Node::new(
        identity.to_string(),
        ProofOfWork::new(TEST_DIFFICULTY).expect("valid difficulty"),
        InMemoryChainFetcher::new(),
    ))
}

fn test_server(node: Arc<Node<InMemoryChainFetcher>>) -> TestServer {
    TestServer::new(build_api_router(node)).expect("Failed to create test server")
}

#[tokio::test]
async fn test_health_and_chain() {
    tokio::time::timeout(Duration::from_secs(10), async {
        let server = test_server(test_node("node-a"));

        let response = server.get("/health").await;
        assert_eq!(response.status_code(), 200);
        let json: Value = response.json();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["chain_length"], 1);
        assert_eq!(json["peers"], 0);
        assert!(json["timestamp"].is_string());

        let response = server.get("/chain").await;
        assert_eq!(response.status_code(), 200);
        let json: Value = response.json();
        assert_eq!(json["length"], 1);
        let genesis = &json["chain"][0];
        assert_eq!(genesis["index"], 1);
        assert_eq!(genesis["proof"], 100);
        assert_eq!(genesis["previous_hash"], "1");
        assert_eq!(genesis["transactions"], json!([]));
        assert!(genesis["timestamp"].is_number());
    })
    .await
    .expect("test_health_and_chain timed out");
}

#[tokio::test]
async fn test_transaction_then_mine() {
    tokio::time::timeout(Duration::from_secs(30), async {
        let node = test_node("node-a");
        let server = test_server(node.clone());

        let response = server
            .post("/transactions/new")
            .json(&json!({"sender": "alice", "recipient": "bob", "amount": 5}))
            .await;
        assert_eq!(response.status_code(), 201);
        let json: Value = response.json();
        assert_eq!(json["message"], "Transaction will be added to Block 2");

        let response = server.get("/mine").await;
        assert_eq!(response.status_code(), 200);
        let json: Value = response.json();
        assert_eq!(json["message"], "The new block has been forged");
        assert_eq!(json["index"], 2);
        assert!(json["proof"].is_u64());
        assert_eq!(json["transactions"].as_array().map(Vec::len), Some(2));
        assert_eq!(json["transactions"][0], json!({"sender": "alice", "recipient": "bob", "amount": 5}));
        assert_eq!(
            json["transactions"][1],
            json!({"sender": "0", "recipient": "node-a", "amount": 1})
        );

        let genesis_hash = node.blockchain.read().await.blocks()[0].hash();
        assert_eq!(json["previous_hash"], genesis_hash);

        let chain: Value = server.get("/chain").await.json();
        assert_eq!(chain["length"], 2);
        let blocks: Vec<Block> = serde_json::from_value(chain["chain"].clone()).expect("chain decodes");
        assert!(validate_chain(&blocks, TEST_DIFFICULTY).is_ok());
    })
    .await
    .expect("test_transaction_then_mine timed out");
}

#[tokio::test]
async fn test_transaction_missing_values() {
    tokio::time::timeout(Duration::from_secs(10), async {
        let node = test_node("node-a");
        let server = test_server(node.clone());

        let response = server
            .post("/transactions/new")
            .json(&json!({"sender": "alice", "amount": 5}))
            .await;
        assert_eq!(response.status_code(), 400);
        let json: Value = response.json();
        assert_eq!(json["error"], "Missing values");

        let response = server
            .post("/transactions/new")
            .json(&json!({"sender": "alice", "recipient": "bob", "amount": "five"}))
            .await;
        assert_eq!(response.status_code(), 400);
        assert!(response.json::<Value>()["error"].is_string());

        assert!(node.blockchain.read().await.pending_transactions().is_empty());
    })
    .await
    .expect("test_transaction_missing_values timed out");
}

#[tokio::test]
async fn test_register_nodes() {
    tokio::time::timeout(Duration::from_secs(10), async {
        let node = test_node("node-a");
        let server = test_server(node.clone());

        let response = server
            .post("/nodes/register")
            .json(&json!({"nodes": ["http://10.0.0.5:5001", "10.0.0.5:5001", "node-b:5002"]}))
            .await;
        assert_eq!(response.status_code(), 201);
        let json: Value = response.json();
        assert_eq!(json["message"], "New nodes have been added");
        assert_eq!(json["total_nodes"], json!(["10.0.0.5:5001", "node-b:5002"]));

        let response = server.post("/nodes/register").json(&json!({"nodes": []})).await;
        assert_eq!(response.status_code(), 400);

        let response = server
            .post("/nodes/register")
            .json(&json!({"nodes": ["node-c:5003", "http://"]}))
            .await;
        assert_eq!(response.status_code(), 400);
        assert!(response.json::<Value>()["error"]
            .as_str()
            .is_some_and(|e| e.contains("Invalid address")));
        assert_eq!(node.peers().await.len(), 2);
    })
    .await
    .expect("test_register_nodes timed out");
}

#[tokio::test]
async fn test_resolve_nodes() {
    tokio::time::timeout(Duration::from_secs(30), async {
        let node = test_node("node-a");

        let mut remote = Blockchain::new();
        let pow = ProofOfWork::with_difficulty(TEST_DIFFICULTY);
        for _ in 0..2 {
            let proof = pow.proof_of_work(remote.last_block());
            remote.new_transaction("0", "node-b", 1u64);
            remote.seal_block(proof, None);
        }
        node.fetcher().insert("node-b:5000", remote.snapshot());

        let server = test_server(node.clone());

        let response = server.get("/nodes/resolve").await;
        assert_eq!(response.status_code(), 200);
        let json: Value = response.json();
        assert_eq!(json["message"], "Our chain is authoritative");
        assert_eq!(json["chain"].as_array().map(Vec::len), Some(1));

        server
            .post("/nodes/register")
            .json(&json!({"nodes": ["http://node-b:5000"]}))
            .await;

        let response = server.get("/nodes/resolve").await;
        assert_eq!(response.status_code(), 200);
        let json: Value = response.json();
        assert_eq!(json["message"], "Our chain was replaced");
        let chain: Vec<Block> = serde_json::from_value(json["chain"].clone()).expect("chain decodes");
        assert_eq!(chain, remote.blocks());

        let health: Value = server.get("/health").await.json();
        assert_eq!(health["chain_length"], 3);
        assert_eq!(health["peers"], 1);
    })
    .await
    .expect("test_resolve_nodes timed out");
}

#[tokio::test]
async fn test_mining_timeout_is_service_unavailable() {
    tokio::time::timeout(Duration::from_secs(10), async {
        let node = Arc::new(
            Node::new(
                "node-a".to_string(),
                ProofOfWork::new(proofchain::miner::MAX_DIFFICULTY).expect("valid difficulty"),
                InMemoryChainFetcher::new(),
            )
            .with_mining_timeout(Duration::from_millis(50)),
        );
        let server = test_server(node);

        let response = server.get("/mine").await;
        assert_eq!(response.status_code(), 503);
        assert!(response.json::<Value>()["error"].is_string());
    })
    .await
    .expect("test_mining_timeout_is_service_unavailable timed out");
}
