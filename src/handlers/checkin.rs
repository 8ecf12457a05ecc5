use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::checkin::{ScanReply, ScannerFault, StationHandle};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success};

#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub text: String,
}

async fn station(state: &AppState, event_id: &str) -> Result<StationHandle, AppError> {
    state.station(event_id).await.ok_or_else(|| {
        AppError::NotFound(format!("No check-in view is open for event '{}'", event_id))
    })
}

pub async fn open_station(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(request): Json<OpenRequest>,
) -> Result<Response, AppError> {
    let handle = state
        .open_station(&event_id, request.token.as_deref())
        .await?;
    let snapshot = handle.snapshot().await?;
    Ok(success(snapshot, "Check-in view opened"))
}

pub async fn get_station(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let snapshot = station(&state, &event_id).await?.snapshot().await?;
    Ok(success(snapshot, "Check-in status"))
}

pub async fn submit_scan(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(request): Json<ScanRequest>,
) -> Result<Response, AppError> {
    let reply = station(&state, &event_id).await?.scan(request.text).await?;
    let message = match &reply {
        ScanReply::Ignored => "Repeated decode ignored".to_string(),
        ScanReply::Processed(outcome) => outcome.message.clone(),
    };
    Ok(success(reply, message))
}

pub async fn report_fault(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(fault): Json<ScannerFault>,
) -> Result<Response, AppError> {
    station(&state, &event_id).await?.report_fault(fault).await?;
    Ok(empty_success("Scanner fault recorded"))
}

pub async fn retry(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let handle = station(&state, &event_id).await?;
    handle.retry().await?;
    Ok(success(handle.snapshot().await?, "Refreshing event data"))
}

pub async fn close_station(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    if state.close_station(&event_id).await {
        Ok(empty_success("Check-in view closed"))
    } else {
        Err(AppError::NotFound(format!(
            "No check-in view is open for event '{}'",
            event_id
        )))
    }
}
