//! HTTP client for the three limiter surfaces

use crate::errors::{CliError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Base URLs of the admission, admin, and refresh services.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub admission: String,
    pub admin: String,
    pub refresh: String,
}

/// Thin JSON-over-POST client shared by all commands.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl ServiceClient {
    pub fn new(endpoints: Endpoints) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(CliError::Transport)?;
        Ok(Self { http, endpoints })
    }

    pub async fn admission<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.post(&self.endpoints.admission, path, Some(body)).await
    }

    pub async fn admin<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.post(&self.endpoints.admin, path, Some(body)).await
    }

    pub async fn refresh<B, R>(&self, path: &str, body: Option<&B>) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.post(&self.endpoints.refresh, path, body).await
    }

    async fn post<B, R>(&self, base: &str, path: &str, body: Option<&B>) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", base.trim_end_matches('/'), path);
        let mut request = self.http.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json::<R>().await?)
        } else {
            let message = match response.json::<serde_json::Value>().await {
                Ok(value) => match value.get("error").and_then(|e| e.as_str()) {
                    Some(error) => error.to_string(),
                    None => value.to_string(),
                },
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            };
            Err(CliError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }
}
