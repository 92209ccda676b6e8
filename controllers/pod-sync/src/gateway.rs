//! Gateway inventory: managed assets in JumpServer.
//!
//! Wraps a `JumpServerClientTrait` and translates between JumpServer assets
//! and the reconciler's records. Authentication is handled inside the
//! client; nothing here sees tokens.

use crate::asset::{ActualAsset, DesiredAsset};
use crate::config::SyncConfig;
use crate::error::{ControllerError, bounded};
use crate::identity::AssetIdentity;
use jumpserver_client::{CreateAssetRequest, JumpServerClientTrait, JumpServerError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Result of listing the gateway.
#[derive(Debug, Default)]
pub struct ActualInventory {
    /// Assets whose hostname is a well-formed identity
    pub assets: Vec<ActualAsset>,
    /// Assets owned by someone else; never touched
    pub foreign: usize,
}

/// Outcome of a create call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// New asset id
    Created(String),
    /// The identity was already registered
    AlreadyExists,
}

/// Outcome of a delete call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Nothing to delete; treated as success
    AlreadyAbsent,
}

/// Gateway Inventory Adapter.
pub struct GatewayInventory {
    client: Arc<dyn JumpServerClientTrait>,
    admin_user_id: Option<String>,
    timeout: Duration,
}

impl GatewayInventory {
    pub fn new(client: Arc<dyn JumpServerClientTrait>, admin_user_id: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            admin_user_id,
            timeout,
        }
    }

    pub async fn list_actual_assets(&self) -> Result<ActualInventory, ControllerError> {
        let assets = bounded(self.timeout, "list assets", self.client.list_assets()).await?;

        let mut inventory = ActualInventory::default();
        for asset in assets {
            match AssetIdentity::parse(&asset.hostname) {
                Some(identity) => inventory.assets.push(ActualAsset {
                    identity,
                    id: asset.id,
                    address: asset.ip,
                    port: asset.port,
                }),
                None => {
                    debug!(hostname = %asset.hostname, "Ignoring asset not managed by this controller");
                    inventory.foreign += 1;
                }
            }
        }
        Ok(inventory)
    }

    /// Register `desired`. An existing asset with the same identity is
    /// reported as `AlreadyExists`, not as an error.
    pub async fn create_asset(&self, desired: &DesiredAsset) -> Result<CreateOutcome, ControllerError> {
        let mut request = CreateAssetRequest::ssh(
            desired.identity.as_str(),
            &desired.address,
            desired.port,
            &desired.platform,
        );
        request.comment = desired.comment.clone();
        request.admin_user = self.admin_user_id.clone();

        match bounded(self.timeout, "create asset", self.client.create_asset(&request)).await {
            Ok(asset) => Ok(CreateOutcome::Created(asset.id)),
            Err(ControllerError::JumpServer(JumpServerError::Conflict(_))) => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e),
        }
    }

    /// Remove the asset registered under `identity`. Absence, whether found
    /// by the lookup or reported by the delete itself, is success.
    pub async fn delete_asset(&self, identity: &AssetIdentity) -> Result<DeleteOutcome, ControllerError> {
        let found = bounded(
            self.timeout,
            "find asset",
            self.client.get_asset_by_hostname(identity.as_str()),
        )
        .await?;
        let Some(asset) = found else {
            return Ok(DeleteOutcome::AlreadyAbsent);
        };

        match bounded(self.timeout, "delete asset", self.client.delete_asset(&asset.id)).await {
            Ok(()) => Ok(DeleteOutcome::Deleted),
            Err(ControllerError::JumpServer(JumpServerError::NotFound(_))) => Ok(DeleteOutcome::AlreadyAbsent),
            Err(e) => Err(e),
        }
    }

    pub async fn bind_asset_to_principal(&self, principal: &str, asset_id: &str) -> Result<(), ControllerError> {
        bounded(
            self.timeout,
            "bind asset",
            self.client.bind_asset_to_user(principal, asset_id),
        )
        .await
    }
}

/// Startup checks against JumpServer: credentials are valid, the admin user
/// resolves, and the principal exists. Returns the admin-user id to attach
/// to created assets. Any failure here is fatal.
pub async fn prepare_gateway(
    client: &dyn JumpServerClientTrait,
    config: &SyncConfig,
) -> Result<Option<String>, ControllerError> {
    info!("Validating JumpServer credentials at {}", client.base_url());
    bounded(config.request_timeout, "validate credentials", client.validate_credentials()).await?;
    info!("JumpServer credentials validated");

    let admin_user_id = match config.admin_user.as_deref() {
        Some(name) => {
            let id = bounded(config.request_timeout, "resolve admin user", client.get_admin_user_id(name)).await?;
            info!(admin_user = name, id = %id, "Resolved admin user");
            Some(id)
        }
        None => None,
    };

    if let Some(principal) = config.principal.as_deref() {
        let user = bounded(
            config.request_timeout,
            "look up principal",
            client.get_user_by_username(principal),
        )
        .await?;
        if user.is_none() {
            return Err(ControllerError::InvalidConfig(format!(
                "principal {} does not exist in JumpServer",
                principal
            )));
        }
        info!(principal, "Created assets will be bound to principal");
    }

    Ok(admin_user_id)
}
