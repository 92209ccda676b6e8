//! JumpServer API models
//!
//! These models follow the JumpServer v1 REST serializers. Only the fields
//! the controller reads or writes are modelled; everything else is ignored
//! on deserialization.

use serde::{Deserialize, Deserializer, Serialize};

/// Credentials posted to `/authentication/auth/`
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

/// Token returned by `/authentication/auth/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    #[serde(default = "default_keyword")]
    pub keyword: String,
    #[serde(default)]
    pub date_expired: Option<String>,
}

fn default_keyword() -> String {
    "Bearer".to_string()
}

impl AuthToken {
    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("{} {}", self.keyword, self.token)
    }
}

/// Asset (host entry) as returned by `/assets/assets/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub hostname: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip: String,
    #[serde(default = "default_ssh_port", deserialize_with = "null_as_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default)]
    pub admin_user: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

fn default_ssh_port() -> u16 {
    22
}

/// Hand-registered assets may carry `null` where a value is expected.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_ssh_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u16>::deserialize(deserializer)?.unwrap_or_else(default_ssh_port))
}

/// Request body for creating an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAssetRequest {
    pub ip: String,
    pub hostname: String,
    pub port: u16,
    pub platform: String,
    pub protocol: String,
    pub is_active: bool,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_user: Option<String>,
}

impl CreateAssetRequest {
    /// Active SSH asset with the given address
    pub fn ssh(hostname: impl Into<String>, ip: impl Into<String>, port: u16, platform: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            hostname: hostname.into(),
            port,
            platform: platform.into(),
            protocol: "ssh".to_string(),
            is_active: true,
            comment: String::new(),
            admin_user: None,
        }
    }
}

/// Binding of an asset to a user (`/assets/asset-users/`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUser {
    pub username: String,
    pub asset: String,
}

/// Admin user (privileged account JumpServer uses to manage an asset)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub username: String,
}

/// JumpServer user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub username: String,
}
