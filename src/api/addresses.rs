// Address and UTXO API Endpoints (spec §4.2, §4.3, §6).
//
// Both handlers are thin: they translate query-string conventions into the
// Worker's `DetailLevel`/`AddressFilter`/page0 arguments and hand the rest
// to `Worker::build_address` / `Worker::build_utxo_set`.

use axum::{extract::{Path, Query, State}, http::StatusCode, Json};

use crate::types::{AddressFilter, AddressPage, DetailLevel, UtxoView, VoutFilter};

use super::helpers::{bad_request, worker_error};
use super::types::{AddressQuery, BlockbookError, UtxoQuery};
use super::AppState;

fn detail_level(details: &str) -> Result<DetailLevel, (StatusCode, Json<BlockbookError>)> {
    match details {
        "basic" => Ok(DetailLevel::Basic),
        "balance" => Ok(DetailLevel::Balance),
        "tokens" => Ok(DetailLevel::Tokens),
        "txids" => Ok(DetailLevel::TxidsOnly),
        "txslight" => Ok(DetailLevel::LightHistory),
        "txs" => Ok(DetailLevel::FullHistory),
        other => Err(bad_request(format!("unknown details level '{}'", other))),
    }
}

/// GET /api/v2/address/{address}
pub async fn addr_v2(
    Path(address): Path<String>,
    Query(params): Query<AddressQuery>,
    State(state): State<AppState>,
) -> Result<Json<AddressPage>, (StatusCode, Json<BlockbookError>)> {
    let detail = detail_level(&params.details)?;
    let filter = AddressFilter {
        vout: VoutFilter::Off,
        from_height: params.from.unwrap_or(0) as i32,
        to_height: params.to.unwrap_or(0) as i32,
        contract: params.contract.clone(),
        only_confirmed: false,
    };
    let page0 = params.page.saturating_sub(1) as i64;

    state
        .worker
        .build_address(&address, page0, params.page_size as usize, detail, &filter)
        .await
        .map(Json)
        .map_err(worker_error)
}

/// GET /api/v2/utxo/{address}
pub async fn utxo_v2(
    Path(address): Path<String>,
    Query(query): Query<UtxoQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<UtxoView>>, (StatusCode, Json<BlockbookError>)> {
    state.worker.build_utxo_set(&address, query.confirmed).await.map(Json).map_err(worker_error)
}
