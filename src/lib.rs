//! proofchain - a proof-of-work ledger whose nodes converge on the longest
//! valid chain
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, canonical hashing, the ledger and chain validation
//! - [`transaction`] - Transaction and amount types
//!
//! ## Consensus & Mining
//! - [`miner`] - Proof-of-work search and verification
//! - [`consensus`] - Longest-valid-chain resolution
//!
//! ## Networking
//! - [`peers`] - Peer address normalization and the peer set
//! - [`network`] - Fetching chains from peers
//! - [`node`] - A node tying the ledger, miner and peers together
//! - [`api`] - HTTP API (feature `api`)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`logging`] - Tracing subscriber setup

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod consensus;
pub mod miner;

// ============================================================================
// Networking
// ============================================================================
pub mod network;
pub mod node;
pub mod peers;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod logging;
