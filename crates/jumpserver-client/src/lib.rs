//! JumpServer REST API Client
//!
//! A Rust client library for the JumpServer bastion REST API (v1).
//! Provides typed models and methods for asset inventory operations.
//!
//! # Example
//!
//! ```no_run
//! use jumpserver_client::{CreateAssetRequest, JumpServerClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = JumpServerClient::new(
//!     "http://jumpserver:80/api/v1".to_string(),
//!     "admin".to_string(),
//!     "secret".to_string(),
//!     Duration::from_secs(30),
//! )?;
//!
//! // List the whole inventory
//! let assets = client.list_assets().await?;
//!
//! // Register a host and let a user log in to it
//! let request = CreateAssetRequest::ssh("pod-a__shell__ssh", "10.0.0.12", 22, "Linux");
//! let asset = client.create_asset(&request).await?;
//! client.bind_asset_to_user("ops", &asset.id).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Session handling**: tokens are acquired lazily and refreshed on 401
//! - **Pagination**: `next` links are followed for every listing
//! - **Status mapping**: 404 and create conflicts surface as distinct errors

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod jumpserver_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::{JumpServerClient, LIST_PAGE_SIZE};
pub use common::{HttpClient, PaginatedResponse};
pub use error::JumpServerError;
pub use models::*;
pub use jumpserver_trait::JumpServerClientTrait;
#[cfg(feature = "test-util")]
pub use mock::MockJumpServerClient;
