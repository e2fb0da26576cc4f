use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::types::{AppHealth, Direction, InterfaceStatus, UserCount};

/// Read-only source of the three status kinds the poller renders.
///
/// Implemented over HTTP by [`HttpFetcher`]; tests substitute an in-memory source.
pub trait StatusSource: Send + Sync + 'static {
    fn app_health(&self, app_id: u64) -> impl Future<Output = Result<AppHealth>> + Send;

    fn user_count(&self, app_id: u64) -> impl Future<Output = Result<UserCount>> + Send;

    fn interface_status(
        &self,
        interface_id: &str,
        direction: Direction,
    ) -> impl Future<Output = Result<InterfaceStatus>> + Send;
}

/// Fetches status JSON from the upstream monitoring service.
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("appmonitor-poller")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and decode the body. Non-2xx statuses are errors; the body is
    /// not inspected in that case.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Status { url, status: status.as_u16() });
        }

        let body = resp.bytes().await?;
        debug!(url = %url, bytes = body.len(), "status fetch ok");
        Ok(serde_json::from_slice(&body)?)
    }
}

impl StatusSource for HttpFetcher {
    async fn app_health(&self, app_id: u64) -> Result<AppHealth> {
        self.get_json(&format!("/api/app/health/{app_id}")).await
    }

    async fn user_count(&self, app_id: u64) -> Result<UserCount> {
        self.get_json(&format!("/api/app/users/{app_id}")).await
    }

    async fn interface_status(&self, interface_id: &str, direction: Direction) -> Result<InterfaceStatus> {
        self.get_json(&format!("/api/interface/{interface_id}/{}", direction.as_str()))
            .await
    }
}
