//! Timestamp administration over any allow-listed table.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use uuid::Uuid;

use crate::cid::Cid;
use crate::db::TimestampPatch;
use crate::error::{StoreError, StoreResult};
use crate::server::router::AppState;

fn parse_id(raw: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| StoreError::validation(format!("malformed id `{raw}`")))
}

pub async fn patch_timestamps(
    State(state): State<AppState>,
    Extension(cid): Extension<Cid>,
    Path((table, id)): Path<(String, String)>,
    body: Result<Json<TimestampPatch>, JsonRejection>,
) -> Result<StatusCode, StoreError> {
    let id = parse_id(&id)?;
    let Json(patch) =
        body.map_err(|rejection| StoreError::validation(rejection.body_text()))?;
    state
        .timestamper
        .patch_timestamps(&table, id, &patch, &cid)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn undelete(
    State(state): State<AppState>,
    Extension(cid): Extension<Cid>,
    Path((table, id)): Path<(String, String)>,
) -> Result<StatusCode, StoreError> {
    let id = parse_id(&id)?;
    state.timestamper.undelete(&table, id, &cid).await?;
    Ok(StatusCode::NO_CONTENT)
}
