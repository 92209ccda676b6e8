//! Mock JumpServerClient for unit testing
//!
//! This module provides a mock implementation of JumpServerClientTrait that
//! can be used in unit tests without requiring a running JumpServer instance.

use crate::error::JumpServerError;
use crate::jumpserver_trait::JumpServerClientTrait;
use crate::models::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock JumpServerClient for testing
///
/// Stores assets in memory and can be configured to fail specific
/// operations. Clones share the same state, so a test can keep one handle
/// for assertions while the code under test owns another.
#[derive(Clone, Default)]
pub struct MockJumpServerClient {
    base_url: String,
    // Assets keyed by id
    assets: Arc<Mutex<HashMap<String, Asset>>>,
    bindings: Arc<Mutex<Vec<AssetUser>>>,
    admin_users: Arc<Mutex<HashMap<String, String>>>,
    users: Arc<Mutex<HashMap<String, User>>>,
    // Failure injection, keyed by hostname
    failing_creates: Arc<Mutex<HashSet<String>>>,
    failing_deletes: Arc<Mutex<HashSet<String>>>,
    deleted_externally: Arc<Mutex<HashSet<String>>>,
    fail_listing: Arc<AtomicBool>,
    fail_binds: Arc<AtomicBool>,
    // Call counters
    create_calls: Arc<AtomicUsize>,
    delete_calls: Arc<AtomicUsize>,
    bind_calls: Arc<AtomicUsize>,
}

impl MockJumpServerClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Add an asset to the mock store (for test setup); returns its id
    pub fn add_asset(&self, hostname: &str, ip: &str, port: u16) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let asset = Asset {
            id: id.clone(),
            hostname: hostname.to_string(),
            ip: ip.to_string(),
            port,
            platform: Some("Linux".to_string()),
            protocol: Some("ssh".to_string()),
            is_active: true,
            admin_user: None,
            comment: None,
        };
        self.assets.lock().unwrap().insert(id.clone(), asset);
        id
    }

    /// Register an admin user (for test setup)
    pub fn add_admin_user(&self, name: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.admin_users.lock().unwrap().insert(name.to_string(), id.clone());
        id
    }

    /// Register a user (for test setup)
    pub fn add_user(&self, username: &str) {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: username.to_string(),
            username: username.to_string(),
        };
        self.users.lock().unwrap().insert(username.to_string(), user);
    }

    /// Make `create_asset` fail with a transport error for this hostname
    pub fn fail_create_for(&self, hostname: &str) {
        self.failing_creates.lock().unwrap().insert(hostname.to_string());
    }

    /// Make `delete_asset` fail with a transport error for this hostname
    pub fn fail_delete_for(&self, hostname: &str) {
        self.failing_deletes.lock().unwrap().insert(hostname.to_string());
    }

    /// Simulate an asset removed by someone else after it was listed: it
    /// keeps showing up in reads, but deleting it answers 404.
    pub fn mark_deleted_externally(&self, hostname: &str) {
        self.deleted_externally.lock().unwrap().insert(hostname.to_string());
    }

    /// Make every listing fail with a transport error
    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Make every bind fail with a transport error
    pub fn set_fail_binds(&self, fail: bool) {
        self.fail_binds.store(fail, Ordering::SeqCst);
    }

    /// Hostnames currently stored, sorted
    pub fn hostnames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .assets
            .lock()
            .unwrap()
            .values()
            .map(|a| a.hostname.clone())
            .collect();
        names.sort();
        names
    }

    /// Stored asset with this hostname
    pub fn asset(&self, hostname: &str) -> Option<Asset> {
        self.assets
            .lock()
            .unwrap()
            .values()
            .find(|a| a.hostname == hostname)
            .cloned()
    }

    /// Recorded asset-user bindings
    pub fn bindings(&self) -> Vec<AssetUser> {
        self.bindings.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn bind_calls(&self) -> usize {
        self.bind_calls.load(Ordering::SeqCst)
    }

    fn injected(what: &str) -> JumpServerError {
        JumpServerError::Api(format!("injected failure: {}", what))
    }
}

#[async_trait::async_trait]
impl JumpServerClientTrait for MockJumpServerClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn validate_credentials(&self) -> Result<(), JumpServerError> {
        Ok(())
    }

    async fn list_assets(&self) -> Result<Vec<Asset>, JumpServerError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(Self::injected("list_assets"));
        }
        Ok(self.assets.lock().unwrap().values().cloned().collect())
    }

    async fn get_asset_by_hostname(&self, hostname: &str) -> Result<Option<Asset>, JumpServerError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(Self::injected("get_asset_by_hostname"));
        }
        Ok(self.asset(hostname))
    }

    async fn create_asset(&self, request: &CreateAssetRequest) -> Result<Asset, JumpServerError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_creates.lock().unwrap().contains(&request.hostname) {
            return Err(Self::injected("create_asset"));
        }
        let mut assets = self.assets.lock().unwrap();
        if assets.values().any(|a| a.hostname == request.hostname) {
            return Err(JumpServerError::Conflict(format!(
                "asset with hostname {} already exists",
                request.hostname
            )));
        }
        let asset = Asset {
            id: uuid::Uuid::new_v4().to_string(),
            hostname: request.hostname.clone(),
            ip: request.ip.clone(),
            port: request.port,
            platform: Some(request.platform.clone()),
            protocol: Some(request.protocol.clone()),
            is_active: request.is_active,
            admin_user: request.admin_user.clone(),
            comment: Some(request.comment.clone()),
        };
        assets.insert(asset.id.clone(), asset.clone());
        Ok(asset)
    }

    async fn delete_asset(&self, id: &str) -> Result<(), JumpServerError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut assets = self.assets.lock().unwrap();
        let hostname = assets
            .get(id)
            .map(|a| a.hostname.clone())
            .ok_or_else(|| JumpServerError::NotFound(format!("asset {}", id)))?;
        if self.failing_deletes.lock().unwrap().contains(&hostname) {
            return Err(Self::injected("delete_asset"));
        }
        assets.remove(id);
        if self.deleted_externally.lock().unwrap().remove(&hostname) {
            return Err(JumpServerError::NotFound(format!("asset {}", id)));
        }
        Ok(())
    }

    async fn bind_asset_to_user(&self, username: &str, asset_id: &str) -> Result<(), JumpServerError> {
        self.bind_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_binds.load(Ordering::SeqCst) {
            return Err(Self::injected("bind_asset_to_user"));
        }
        self.bindings.lock().unwrap().push(AssetUser {
            username: username.to_string(),
            asset: asset_id.to_string(),
        });
        Ok(())
    }

    async fn get_admin_user_id(&self, name: &str) -> Result<String, JumpServerError> {
        self.admin_users
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| JumpServerError::NotFound(format!("admin user {}", name)))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, JumpServerError> {
        Ok(self.users.lock().unwrap().get(username).cloned())
    }
}
