// API Module
//
// Blockbook-compatible HTTP surface (spec §6). Every handler is a thin
// wrapper around a `Worker` method; this module owns routing, query-param
// parsing, and `WorkerError` -> HTTP translation only.

pub mod addresses;
pub mod blocks;
pub mod helpers;
pub mod network;
pub mod transactions;
pub mod types;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::worker::Worker;

#[derive(Clone)]
pub struct AppState {
    pub worker: Arc<Worker>,
}

pub fn build_router(worker: Arc<Worker>) -> Router {
    let state = AppState { worker };

    Router::new()
        .route("/", get(root_handler))
        .route("/api", get(api_handler))
        .route("/api/v2/status", get(network::status_v2))
        .route("/api/v2/mempool", get(network::mempool_v2))
        .route("/api/v2/mempool/{txid}", get(network::mempool_tx_v2))
        .route("/api/v2/block-index/{hash_or_height}", get(blocks::block_index_v2))
        .route("/api/v2/block/{hash_or_height}", get(blocks::block_v2))
        .route("/api/v2/tx/{txid}", get(transactions::tx_v2))
        .route("/api/v2/address/{address}", get(addresses::addr_v2))
        .route("/api/v2/utxo/{address}", get(addresses::utxo_v2))
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

pub async fn root_handler() -> &'static str {
    "pivx-query-worker"
}

pub async fn api_handler() -> &'static str {
    "API response"
}

pub async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}
