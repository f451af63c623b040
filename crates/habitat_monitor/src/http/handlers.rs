use crate::domain::{
    filter_window, parse_payload, tail, CommandContext, Series, DEFAULT_DATA_LIMIT,
};
use crate::http::{ApiError, ApiResult, AppState};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use common::domain::HabitatStatus;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub tortoise_status: HabitatStatus,
}

/// Sensor ingestion. Alerts raised by the reading are delivered before the response.
pub async fn update(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<UpdateResponse>> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Invalid JSON".to_string()))?;
    let new_reading = parse_payload(payload)?;

    let receipt = state.ingestion.ingest(new_reading).await?;
    if let Some(alert) = receipt.alert {
        // failures are logged by the dispatcher; the reading is already stored
        let _ = state.alerts.dispatch(alert).await;
    }

    Ok(Json(UpdateResponse {
        status: "OK",
        message: "Data received",
        tortoise_status: receipt.status,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    pub hours: Option<u32>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub data: Series,
}

/// Stored readings, optionally limited to the last `hours`, then to the last `limit` entries.
pub async fn data(
    State(state): State<AppState>,
    query: Result<Query<DataQuery>, QueryRejection>,
) -> ApiResult<Json<DataResponse>> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut series = state.store.snapshot().await;
    if let Some(hours) = query.hours.filter(|h| *h > 0) {
        series = filter_window(&series, Utc::now(), i64::from(hours));
    }
    let series = tail(&series, query.limit.unwrap_or(DEFAULT_DATA_LIMIT));

    Ok(Json(DataResponse { data: series }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub data_points: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        data_points: state.store.size().await,
    })
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Habitat monitor API is running",
        "endpoints": {
            "/update": "POST - Update sensor data",
            "/data": "GET - Retrieve sensor data (optional: hours, limit)",
            "/commands": "POST - Run a chat command",
            "/health": "GET - Health check"
        }
    }))
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct AttachmentBody {
    pub filename: String,
    pub content_type: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub messages: Vec<String>,
    pub attachment: Option<AttachmentBody>,
}

/// Chat bridge entry point: run one `!`-command and return what to post back.
pub async fn command(
    State(state): State<AppState>,
    request: Result<Json<CommandRequest>, JsonRejection>,
) -> ApiResult<Json<CommandResponse>> {
    let Json(request) = request.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let context = CommandContext {
        channel_id: request.channel_id,
        channel_name: request.channel_name,
    };

    let reply = state.commands.handle(&context, &request.content).await;

    Ok(Json(CommandResponse {
        messages: reply.messages,
        attachment: reply.attachment.map(|artifact| AttachmentBody {
            filename: artifact.filename,
            content_type: artifact.content_type,
            body: String::from_utf8_lossy(&artifact.body).into_owned(),
        }),
    }))
}
