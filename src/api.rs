//! REST API for a proofchain node
//!
//! Exposes mining, transaction submission, the chain, peer registration and
//! consensus resolution over HTTP. Handlers are generic over the
//! [`ChainFetcher`] so the same router serves HTTP-connected nodes and
//! in-memory test networks.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blockchain::{Block, ChainSnapshot};
use crate::error::ChainError;
use crate::network::ChainFetcher;
use crate::node::Node;
use crate::peers::normalize_address;
use crate::transaction::{Amount, Transaction};

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Chain(ChainError),
    InvalidInput(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Chain(ChainError::InvalidAddress(_)) => StatusCode::BAD_REQUEST,
            ApiError::Chain(ChainError::MiningTimeout(_) | ChainError::MiningCancelled) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Chain(ChainError::PeerUnreachable { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Chain(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self {
            ApiError::Chain(e) => e.to_string(),
            ApiError::InvalidInput(msg) => msg,
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::Chain(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl From<Block> for MineResponse {
    fn from(block: Block) -> Self {
        MineResponse {
            message: "The new block has been forged".to_string(),
            index: block.index,
            transactions: block.transactions,
            proof: block.proof,
            previous_hash: block.previous_hash,
        }
    }
}

/// Fields are optional so a missing one is reported as "Missing values"
/// rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct NewTransactionRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<Amount>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterNodesRequest {
    #[serde(default)]
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterNodesResponse {
    pub message: String,
    pub total_nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub message: String,
    pub chain: Vec<Block>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub chain_length: usize,
    pub peers: usize,
    pub timestamp: String,
}

/// Detailed request logging middleware. Logs method, path, status and
/// duration.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        path = %path,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints.
pub fn build_api_router<F: ChainFetcher>(node: Arc<Node<F>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/mine", get(mine::<F>))
        .route("/chain", get(full_chain::<F>))
        .route("/transactions/new", post(new_transaction::<F>))
        .route("/nodes/register", post(register_nodes::<F>))
        .route("/nodes/resolve", get(resolve_nodes::<F>))
        .route("/health", get(health_check::<F>))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node)
        .layer(cors)
}

/// Serve the API on `host:port` until the process exits.
pub async fn run_api_server<F: ChainFetcher>(
    node: Arc<Node<F>>,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "api.listening");

    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn mine<F: ChainFetcher>(State(node): State<Arc<Node<F>>>) -> Result<Json<MineResponse>, ApiError> {
    let block = node.mine_block().await?;
    Ok(Json(block.into()))
}

async fn full_chain<F: ChainFetcher>(State(node): State<Arc<Node<F>>>) -> Json<ChainSnapshot> {
    Json(node.get_chain().await)
}

async fn new_transaction<F: ChainFetcher>(
    State(node): State<Arc<Node<F>>>,
    payload: Result<Json<NewTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidInput(e.body_text()))?;

    let (Some(sender), Some(recipient), Some(amount)) = (request.sender, request.recipient, request.amount)
    else {
        return Err(ApiError::InvalidInput("Missing values".to_string()));
    };

    let index = node.submit_transaction(sender, recipient, amount).await;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Transaction will be added to Block {}", index),
        }),
    ))
}

async fn register_nodes<F: ChainFetcher>(
    State(node): State<Arc<Node<F>>>,
    payload: Result<Json<RegisterNodesRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterNodesResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidInput(e.body_text()))?;

    if request.nodes.is_empty() {
        return Err(ApiError::InvalidInput(
            "Error: Please supply a valid list of nodes".to_string(),
        ));
    }

    // Reject the whole batch if any address is bad.
    for address in &request.nodes {
        normalize_address(address)?;
    }
    for address in &request.nodes {
        node.register_peer(address).await?;
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterNodesResponse {
            message: "New nodes have been added".to_string(),
            total_nodes: node.peers().await,
        }),
    ))
}

async fn resolve_nodes<F: ChainFetcher>(State(node): State<Arc<Node<F>>>) -> Result<Json<ResolveResponse>, ApiError> {
    let replaced = node.resolve_conflicts().await?;
    let message = if replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };

    Ok(Json(ResolveResponse {
        message: message.to_string(),
        chain: node.get_chain().await.chain,
    }))
}

async fn health_check<F: ChainFetcher>(State(node): State<Arc<Node<F>>>) -> Json<HealthResponse> {
    let chain_length = node.blockchain.read().await.len();
    let peers = node.peers.read().await.len();

    Json(HealthResponse {
        status: "healthy".to_string(),
        chain_length,
        peers,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
