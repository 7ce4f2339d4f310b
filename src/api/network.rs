// Network-Level API Endpoints (spec §6 `/status`, `/mempool`).

use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::types::{SystemInfo, Tx};

use super::helpers::worker_error;
use super::types::BlockbookError;
use super::AppState;

#[derive(Deserialize, Default)]
pub struct StatusQuery {
    #[serde(default, rename = "includeInternal")]
    pub include_internal: bool,
}

/// GET /api/v2/status?includeInternal=true
pub async fn status_v2(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<SystemInfo>, (StatusCode, Json<BlockbookError>)> {
    state.worker.build_system_info(query.include_internal).await.map(Json).map_err(worker_error)
}

#[derive(Serialize)]
pub struct MempoolListing {
    pub size: usize,
    pub txids: Vec<String>,
}

/// GET /api/v2/mempool
pub async fn mempool_v2(State(state): State<AppState>) -> Json<MempoolListing> {
    let txids = state.worker.mempool.txids();
    Json(MempoolListing { size: txids.len(), txids })
}

/// GET /api/v2/mempool/{txid}
pub async fn mempool_tx_v2(
    Path(txid): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Tx>, (StatusCode, Json<BlockbookError>)> {
    if state.worker.mempool.entry(&txid).is_none() {
        return Err((StatusCode::NOT_FOUND, Json(BlockbookError::new(format!("{} not in mempool", txid)))));
    }
    state.worker.build_tx(&txid, false).await.map(Json).map_err(worker_error)
}
