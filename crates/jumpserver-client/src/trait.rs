//! JumpServerClient trait for mocking
//!
//! This trait abstracts the JumpServerClient so the controller can be unit
//! tested against an in-memory implementation.

use crate::error::JumpServerError;
use crate::models::*;

/// Trait for JumpServer API client operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait JumpServerClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Authenticate and discard the token
    async fn validate_credentials(&self) -> Result<(), JumpServerError>;

    // Asset operations
    async fn list_assets(&self) -> Result<Vec<Asset>, JumpServerError>;
    async fn get_asset_by_hostname(&self, hostname: &str) -> Result<Option<Asset>, JumpServerError>;
    async fn create_asset(&self, request: &CreateAssetRequest) -> Result<Asset, JumpServerError>;
    async fn delete_asset(&self, id: &str) -> Result<(), JumpServerError>;
    async fn bind_asset_to_user(&self, username: &str, asset_id: &str) -> Result<(), JumpServerError>;

    // User operations
    async fn get_admin_user_id(&self, name: &str) -> Result<String, JumpServerError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, JumpServerError>;
}
