//! HTTP source for the dashboard backend.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::TelemetrySource;
use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::pipeline::types::{
    ControlAck, ControlAction, DeviceList, DeviceReading, GridContext, TelemetryBatch,
};

/// Fetches telemetry and grid context from the backend's REST routes:
///
/// - `GET  /api/live`
/// - `GET  /api/grid`
/// - `GET  /api/devices`
/// - `GET  /api/devices/{device_id}`
/// - `POST /api/devices/{device_id}/control/{on|off|start|inject-fault}`
/// - `POST /api/devices/{device_id}/control/brightness?level=N`
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
    description: String,
}

impl HttpSource {
    /// Creates a source for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Transport` if the HTTP client cannot be built.
    pub fn new(cfg: &SourceConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(cfg.timeout())
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build http client: {e}")))?;
        let base_url = cfg.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            description: format!("http: {base_url}"),
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, FetchError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Turns a 400 into `Rejected`, using the backend's `detail` text when present.
    async fn rejection(device_id: &str, resp: Response) -> FetchError {
        let detail = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_owned))
            .unwrap_or_else(|| "bad request".to_string());
        FetchError::Rejected(format!("{device_id}: {detail}"))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = self.client.get(&url).send().await?;
        Self::decode(resp).await
    }
}

#[async_trait]
impl TelemetrySource for HttpSource {
    async fn fetch_live_telemetry(&self) -> Result<TelemetryBatch, FetchError> {
        self.get_json("/api/live").await
    }

    async fn fetch_grid_context(&self) -> Result<GridContext, FetchError> {
        self.get_json("/api/grid").await
    }

    async fn list_devices(&self) -> Result<DeviceList, FetchError> {
        self.get_json("/api/devices").await
    }

    async fn fetch_device(&self, device_id: &str) -> Result<DeviceReading, FetchError> {
        let url = self.url(&format!("/api/devices/{device_id}"));
        debug!(%url, "GET");
        let resp = self.client.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::UnknownDevice(device_id.to_string()));
        }
        Self::decode(resp).await
    }

    async fn send_device_control(
        &self,
        device_id: &str,
        action: ControlAction,
    ) -> Result<ControlAck, FetchError> {
        let url = self.url(&format!("/api/devices/{device_id}/control/{}", action.as_str()));
        debug!(%url, %action, "POST");
        let mut req = self.client.post(&url);
        if let Some(param) = action.query() {
            req = req.query(&[param]);
        }
        let resp = req.send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(FetchError::UnknownDevice(device_id.to_string())),
            StatusCode::BAD_REQUEST => Err(Self::rejection(device_id, resp).await),
            _ => Self::decode(resp).await,
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}
