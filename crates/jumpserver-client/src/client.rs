//! JumpServer API client
//!
//! Implements the JumpServer REST API v1 client for asset operations.
//! Based on the JumpServer API structure: /api/v1/assets/assets/ and
//! /api/v1/assets/asset-users/

use crate::common::HttpClient;
use crate::error::JumpServerError;
use crate::jumpserver_trait::JumpServerClientTrait;
use crate::models::*;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Page size used for listings. Large enough that a single page normally
/// holds the whole inventory; `next` links are still followed.
pub const LIST_PAGE_SIZE: u32 = 65535;

/// JumpServer API client
pub struct JumpServerClient {
    http: HttpClient,
}

impl JumpServerClient {
    /// Create a new JumpServer client
    ///
    /// # Arguments
    /// * `base_url` - API base URL including the version segment (e.g., "http://jms:80/api/v1")
    /// * `username` / `password` - credentials used to obtain session tokens
    /// * `timeout` - bound applied to every HTTP request
    pub fn new(
        base_url: String,
        username: String,
        password: String,
        timeout: Duration,
    ) -> Result<Self, JumpServerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(JumpServerError::Http)?;

        Ok(Self {
            http: HttpClient::new(client, base_url, username, password),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Authenticate eagerly so bad credentials surface before any sync work.
    pub async fn validate_credentials(&self) -> Result<(), JumpServerError> {
        debug!("Validating JumpServer credentials and connectivity");
        self.http.authenticate().await?;
        debug!("Credentials validated successfully");
        Ok(())
    }

    /// List every asset
    pub async fn list_assets(&self) -> Result<Vec<Asset>, JumpServerError> {
        let limit = LIST_PAGE_SIZE.to_string();
        self.query_assets(&[("offset", "0"), ("limit", &limit)]).await
    }

    /// Query assets by filter (e.g., [("hostname", "pod-a__web__ssh")])
    pub async fn query_assets(&self, filters: &[(&str, &str)]) -> Result<Vec<Asset>, JumpServerError> {
        let mut url = self.http.build_url("/assets/assets/");
        if !filters.is_empty() {
            url = format!("{}?{}", url, self.http.build_query_string(filters));
        }
        debug!("Querying assets with filters: {:?}", filters);
        self.http.fetch_all_pages(url).await
    }

    /// Find the asset with exactly this hostname
    ///
    /// # Returns
    /// * `Ok(Some(Asset))` - The asset if found
    /// * `Ok(None)` - If no asset has that hostname
    /// * `Err(JumpServerError)` - If the request fails
    pub async fn get_asset_by_hostname(&self, hostname: &str) -> Result<Option<Asset>, JumpServerError> {
        let limit = LIST_PAGE_SIZE.to_string();
        let assets = self
            .query_assets(&[("hostname", hostname), ("offset", "0"), ("limit", &limit)])
            .await?;
        // The hostname filter is exact upstream, but older releases treat it
        // as a substring search.
        Ok(assets.into_iter().find(|a| a.hostname == hostname))
    }

    /// Create an asset
    ///
    /// # Returns
    /// * `Ok(Asset)` - The created asset, carrying its JumpServer id
    /// * `Err(JumpServerError::Conflict)` - If the hostname is already registered
    pub async fn create_asset(&self, request: &CreateAssetRequest) -> Result<Asset, JumpServerError> {
        if request.hostname.is_empty() {
            return Err(JumpServerError::InvalidRequest("asset hostname is empty".to_string()));
        }
        debug!("Creating asset {} ({}:{})", request.hostname, request.ip, request.port);
        let body = serde_json::to_value(request)?;
        self.http.post("/assets/assets/", &body).await
    }

    /// Delete an asset by id
    pub async fn delete_asset(&self, id: &str) -> Result<(), JumpServerError> {
        debug!("Deleting asset: {}", id);
        self.http.delete(&format!("/assets/assets/{}/", id)).await
    }

    /// Bind an asset to a user so the user can log in to it
    pub async fn bind_asset_to_user(&self, username: &str, asset_id: &str) -> Result<(), JumpServerError> {
        debug!("Binding asset {} to user {}", asset_id, username);
        let body = serde_json::to_value(AssetUser {
            username: username.to_string(),
            asset: asset_id.to_string(),
        })?;
        let _: serde_json::Value = self.http.post("/assets/asset-users/", &body).await?;
        Ok(())
    }

    /// Resolve an admin user's id from its name
    pub async fn get_admin_user_id(&self, name: &str) -> Result<String, JumpServerError> {
        let mut url = self.http.build_url("/assets/admin-users/");
        url = format!("{}?{}", url, self.http.build_query_string(&[("name", name)]));
        let users: Vec<AdminUser> = self.http.fetch_all_pages(url).await?;
        users
            .into_iter()
            .find(|u| u.name == name)
            .map(|u| u.id)
            .ok_or_else(|| JumpServerError::NotFound(format!("admin user {}", name)))
    }

    /// Find a user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, JumpServerError> {
        let mut url = self.http.build_url("/users/users/");
        url = format!("{}?{}", url, self.http.build_query_string(&[("username", username)]));
        let users: Vec<User> = self.http.fetch_all_pages(url).await?;
        Ok(users.into_iter().find(|u| u.username == username))
    }
}

#[async_trait::async_trait]
impl JumpServerClientTrait for JumpServerClient {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    async fn validate_credentials(&self) -> Result<(), JumpServerError> {
        self.validate_credentials().await
    }

    async fn list_assets(&self) -> Result<Vec<Asset>, JumpServerError> {
        self.list_assets().await
    }

    async fn get_asset_by_hostname(&self, hostname: &str) -> Result<Option<Asset>, JumpServerError> {
        self.get_asset_by_hostname(hostname).await
    }

    async fn create_asset(&self, request: &CreateAssetRequest) -> Result<Asset, JumpServerError> {
        self.create_asset(request).await
    }

    async fn delete_asset(&self, id: &str) -> Result<(), JumpServerError> {
        self.delete_asset(id).await
    }

    async fn bind_asset_to_user(&self, username: &str, asset_id: &str) -> Result<(), JumpServerError> {
        self.bind_asset_to_user(username, asset_id).await
    }

    async fn get_admin_user_id(&self, name: &str) -> Result<String, JumpServerError> {
        self.get_admin_user_id(name).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, JumpServerError> {
        self.get_user_by_username(username).await
    }
}
