// Block-Related API Endpoints (spec §4.4, §6).

use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use serde::Serialize;

use crate::types::BlockDetail;

use super::helpers::worker_error;
use super::types::{BlockbookError, PageQuery};
use super::AppState;

#[derive(Serialize)]
pub struct BlockHash {
    #[serde(rename = "blockHash")]
    pub block_hash: String,
}

/// GET /api/v2/block-index/{hashOrHeight}
pub async fn block_index_v2(
    Path(hash_or_height): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<BlockHash>, (StatusCode, Json<BlockbookError>)> {
    state
        .worker
        .resolve_block_hash(&hash_or_height)
        .await
        .map(|block_hash| Json(BlockHash { block_hash }))
        .map_err(worker_error)
}

/// GET /api/v2/block/{hashOrHeight}
pub async fn block_v2(
    Path(hash_or_height): Path<String>,
    Query(params): Query<PageQuery>,
    State(state): State<AppState>,
) -> Result<Json<BlockDetail>, (StatusCode, Json<BlockbookError>)> {
    let page0 = params.page.saturating_sub(1) as i64;
    state
        .worker
        .build_block(&hash_or_height, page0, params.page_size as usize)
        .await
        .map(Json)
        .map_err(worker_error)
}
