//! Record handlers. All run behind the auth middleware.

use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::Json;
use lockbox_core::api::{
    DeleteRecordResponse, GetRecordResponse, ListRecordsQuery, ListRecordsResponse, RecordView,
    SaveRecordRequest, SaveRecordResponse, SyncRecordsRequest, SyncRecordsResponse,
};
use lockbox_core::models::to_micros;
use lockbox_core::LockboxError;

pub async fn save_record(
    Authenticated(owner): Authenticated,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SaveRecordRequest>,
) -> Result<Json<SaveRecordResponse>, ApiError> {
    let outcome = state
        .engine
        .save(&owner, req.record.as_ref(), req.expected_version)?;

    Ok(Json(SaveRecordResponse {
        success: true,
        message: "record saved".to_string(),
        id: outcome.id,
        version: outcome.version,
    }))
}

pub async fn get_record(
    Authenticated(owner): Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GetRecordResponse>, ApiError> {
    let record = state.engine.get(&owner, &id)?;

    Ok(Json(GetRecordResponse {
        success: true,
        message: "ok".to_string(),
        record: record.into(),
    }))
}

pub async fn list_records(
    Authenticated(owner): Authenticated,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListRecordsQuery>,
) -> Result<Json<ListRecordsResponse>, ApiError> {
    let records = state.engine.list(&owner, query.record_type)?;

    Ok(Json(ListRecordsResponse {
        success: true,
        message: format!("{} record(s)", records.len()),
        records: records.into_iter().map(RecordView::from).collect(),
    }))
}

/// `/records/` with the id left off.
pub async fn missing_id(Authenticated(_): Authenticated) -> ApiError {
    ApiError(LockboxError::Validation("record id is required".to_string()))
}

pub async fn delete_record(
    Authenticated(owner): Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteRecordResponse>, ApiError> {
    state.engine.delete(&owner, &id)?;

    Ok(Json(DeleteRecordResponse {
        success: true,
        message: "record deleted".to_string(),
    }))
}

pub async fn sync_records(
    Authenticated(owner): Authenticated,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SyncRecordsRequest>,
) -> Result<Json<SyncRecordsResponse>, ApiError> {
    let changes = state.engine.sync(&owner, req.cursor)?;

    Ok(Json(SyncRecordsResponse {
        success: true,
        message: format!("{} change(s)", changes.records.len()),
        new_cursor: to_micros(changes.cursor),
        records: changes.records.into_iter().map(RecordView::from).collect(),
    }))
}
