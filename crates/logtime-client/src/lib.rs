//! HTTP client for the logtime server.

use anyhow::{Context, Result, bail};
use reqwest::{Client, Response};
use tracing::debug;

use logtime_types::api::{CreateLogRequest, LogResponse, RegisterRequest, UserResponse};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct LogClient {
    http: Client,
    server_url: String,
}

impl LogClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            server_url,
        }
    }

    /// POST /logs
    pub async fn send_log(&self, message: &str, user_id: Option<i64>) -> Result<LogResponse> {
        let body = CreateLogRequest {
            message: message.to_string(),
            user_id,
        };

        let resp = self
            .http
            .post(format!("{}/logs", self.server_url))
            .json(&body)
            .send()
            .await
            .context("Send log failed")?;

        let log: LogResponse = parse(resp, "Send log").await?;
        debug!(log_id = log.id, "Log stored");
        Ok(log)
    }

    /// POST /users
    pub async fn register(&self, username: &str, password: &str) -> Result<UserResponse> {
        let body = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let resp = self
            .http
            .post(format!("{}/users", self.server_url))
            .json(&body)
            .send()
            .await
            .context("Register failed")?;

        parse(resp, "Register").await
    }

    /// GET /logs
    pub async fn list_logs(&self) -> Result<Vec<LogResponse>> {
        let resp = self
            .http
            .get(format!("{}/logs", self.server_url))
            .send()
            .await
            .context("List logs failed")?;

        parse(resp, "List logs").await
    }
}

async fn parse<T: serde::de::DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("{} failed ({}): {}", what, status, body);
    }

    resp.json()
        .await
        .with_context(|| format!("{} returned an unreadable body", what))
}
