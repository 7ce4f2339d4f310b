// Transaction-Related API Endpoints
//
// GET /api/v2/tx/{txid} (spec §6) reconstructs a full `Tx` view via the
// Worker's 8-step transaction assembly (spec §4.1); it never touches rocksdb
// or the node RPC directly.

use axum::{extract::{Path, State}, http::StatusCode, Json};

use crate::types::Tx;

use super::helpers::worker_error;
use super::types::BlockbookError;
use super::AppState;

pub async fn tx_v2(
    Path(txid): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Tx>, (StatusCode, Json<BlockbookError>)> {
    state.worker.build_tx(&txid, true).await.map(Json).map_err(worker_error)
}
