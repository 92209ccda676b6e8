//! Common utilities for the JumpServer API client
//!
//! Provides the authenticated HTTP layer shared by every endpoint: token
//! acquisition, transparent re-authentication, pagination and status
//! mapping.

use crate::error::JumpServerError;
use crate::models::{AuthRequest, AuthToken};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

/// Paginated response wrapper from the JumpServer API (limit/offset style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// List endpoints answer with a bare array when no paging parameters are
/// sent and with a `PaginatedResponse` otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Page(PaginatedResponse<T>),
    Plain(Vec<T>),
}

/// HTTP client wrapper holding the session token
pub struct HttpClient {
    client: Client,
    base_url: String,
    credentials: AuthRequest,
    token: RwLock<Option<AuthToken>>,
}

impl HttpClient {
    /// Create a new HTTP client wrapper. No request is made until first use.
    pub fn new(client: Client, base_url: String, username: String, password: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: AuthRequest { username, password },
            token: RwLock::new(None),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a path (absolute URLs, e.g. `next` links, pass through)
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Acquire a fresh token and cache it
    pub async fn authenticate(&self) -> Result<AuthToken, JumpServerError> {
        let url = self.build_url("/authentication/auth/");
        debug!("Authenticating against {} as {}", url, self.credentials.username);

        let response = self.client
            .post(&url)
            .header("Accept", "application/json")
            .json(&self.credentials)
            .send()
            .await
            .map_err(JumpServerError::Http)?;

        let status = response.status();
        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            let body = response.text().await.unwrap_or_default();
            return Err(JumpServerError::Authentication(format!(
                "{} rejected credentials: {} - {}",
                self.credentials.username, status, body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JumpServerError::Api(format!(
                "POST /authentication/auth/ failed: {} - {}",
                status, body
            )));
        }

        let token: AuthToken = response.json().await.map_err(JumpServerError::Http)?;
        *self.token.write().await = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token; the next request re-authenticates
    pub async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    async fn auth_header(&self) -> Result<String, JumpServerError> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.header_value());
        }
        Ok(self.authenticate().await?.header_value())
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response, JumpServerError> {
        let mut request = self.client
            .request(method, url)
            .header("Authorization", self.auth_header().await?)
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(JumpServerError::Http)
    }

    /// Send an authenticated request. A 401 drops the token, re-authenticates
    /// and retries exactly once.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response, JumpServerError> {
        let url = self.build_url(path);
        debug!("{} {}", method, url);

        let response = self.send_once(method.clone(), &url, body).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("Token rejected for {} {}, re-authenticating", method, url);
        self.invalidate_token().await;
        let response = self.send_once(method.clone(), &url, body).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(JumpServerError::Authentication(format!(
                "{} {} rejected after re-authentication: {}",
                method, path, body
            )));
        }
        Ok(response)
    }

    /// Fetch all pages of a list endpoint, following `next` links
    pub async fn fetch_all_pages<T: for<'de> Deserialize<'de>>(
        &self,
        mut url: String,
    ) -> Result<Vec<T>, JumpServerError> {
        let mut all_results = Vec::new();

        loop {
            debug!("Fetching page: {}", url);

            let response = self.send(Method::GET, &url, None).await?;
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(JumpServerError::Api(format!(
                    "Failed to fetch page: {} - {}",
                    status, body
                )));
            }

            let response_text = response.text().await?;
            let page: ListResponse<T> = serde_json::from_str(&response_text).map_err(|e| {
                JumpServerError::Api(format!(
                    "error decoding response body: {} - Response (first 500 chars): {}",
                    e,
                    response_text.chars().take(500).collect::<String>()
                ))
            })?;

            match page {
                ListResponse::Plain(results) => {
                    all_results.extend(results);
                    break;
                }
                ListResponse::Page(page) => {
                    all_results.extend(page.results);
                    match page.next {
                        Some(next_url) => url = next_url,
                        None => break,
                    }
                }
            }
        }

        Ok(all_results)
    }

    /// Make a POST request. 409, or a 400 saying the object already exists,
    /// maps to `Conflict`.
    pub async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, JumpServerError> {
        let response = self.send(Method::POST, path, Some(body)).await?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(JumpServerError::Http);
        }

        let body_text = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT
            || (status == StatusCode::BAD_REQUEST && body_text.contains("already exists"))
        {
            return Err(JumpServerError::Conflict(format!("POST {}: {}", path, body_text)));
        }
        if status == StatusCode::BAD_REQUEST {
            return Err(JumpServerError::InvalidRequest(format!("POST {}: {}", path, body_text)));
        }
        Err(JumpServerError::Api(format!(
            "POST {} failed: {} - {}",
            path, status, body_text
        )))
    }

    /// Make a DELETE request. 404 maps to `NotFound`.
    pub async fn delete(&self, path: &str) -> Result<(), JumpServerError> {
        let response = self.send(Method::DELETE, path, None).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(JumpServerError::NotFound(format!("DELETE {}", path)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JumpServerError::Api(format!(
                "DELETE {} failed: {} - {}",
                path, status, body
            )));
        }

        Ok(())
    }

    /// Build query string from filters
    pub fn build_query_string(&self, filters: &[(&str, &str)]) -> String {
        filters
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
