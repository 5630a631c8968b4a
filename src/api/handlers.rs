//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use super::AppState;
use super::types::{AdvisoriesResponse, ControlQuery, DevicesResponse, ErrorResponse};
use crate::error::FetchError;
use crate::pipeline::types::{ControlAck, ControlAction, DeviceReading};
use crate::pipeline::{DashboardView, SeriesPoint};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Returns the latest published view.
///
/// `GET /state` → 200 + `DashboardView` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    Json(state.monitor.view())
}

/// Returns the rolling current series, oldest first.
///
/// `GET /series` → 200 + `Vec<SeriesPoint>` JSON
pub async fn get_series(State(state): State<Arc<AppState>>) -> Json<Vec<SeriesPoint>> {
    Json(state.monitor.view().series)
}

/// `GET /advisories` → 200 + `AdvisoriesResponse` JSON
pub async fn get_advisories(State(state): State<Arc<AppState>>) -> Json<AdvisoriesResponse> {
    let view = state.monitor.view();
    Json(AdvisoriesResponse {
        health: view.health,
        advisories: view.advisories,
    })
}

/// `GET /devices` → 200 + `DevicesResponse` JSON
pub async fn get_devices(State(state): State<Arc<AppState>>) -> Json<DevicesResponse> {
    let devices = state.monitor.view().devices;
    Json(DevicesResponse {
        device_count: devices.len(),
        devices,
    })
}

/// `GET /devices/{device_id}` → 200 + `DeviceReading` JSON, or 404
pub async fn get_device(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceReading>, ApiError> {
    state
        .monitor
        .view()
        .device(&device_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| fetch_error_response(&FetchError::UnknownDevice(device_id)))
}

/// Forwards a control command to the backend.
///
/// `POST /devices/{device_id}/control/{on|off|start|inject-fault}` → 200 + `ControlAck` JSON
/// `POST /devices/{device_id}/control/brightness?level=40` → 200 + `ControlAck` JSON
/// `POST /devices/x/control/toggle` → 400 + `ErrorResponse`
/// unknown device → 404, command not supported by the device → 400,
/// backend failure → 502, monitor stopped → 503
pub async fn post_control(
    State(state): State<Arc<AppState>>,
    Path((device_id, action)): Path<(String, String)>,
    Query(query): Query<ControlQuery>,
) -> Result<Json<ControlAck>, ApiError> {
    let action = ControlAction::from_parts(&action, query.level)
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e))))?;

    state
        .monitor
        .control(&device_id, action)
        .await
        .map(Json)
        .map_err(|e| fetch_error_response(&e))
}

fn fetch_error_response(err: &FetchError) -> ApiError {
    let status = match err {
        FetchError::UnknownDevice(_) => StatusCode::NOT_FOUND,
        FetchError::Rejected(_) => StatusCode::BAD_REQUEST,
        FetchError::Closed => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ErrorResponse::new(err.to_string())))
}
