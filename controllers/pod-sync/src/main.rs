//! JumpServer Pod Sync Controller
//!
//! Keeps the JumpServer asset inventory in step with SSH-capable pods:
//! - Pods matching a label selector are listed every interval
//! - Each container port named with the SSH prefix becomes one asset,
//!   named `<pod>__<container>__<port-name>`
//! - Managed assets whose pod is gone are deleted
//!
//! The gateway is always subordinate to cluster state; assets not named by
//! this scheme are left alone.

mod asset;
mod config;
mod controller;
mod error;
mod gateway;
mod health;
mod identity;
mod reconciler;
mod scheduler;
mod source;
#[cfg(test)]
mod test_utils;

use clap::Parser;
use config::{Cli, SyncConfig};
use controller::Controller;
use crate::error::ControllerError;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Install the ring crypto provider before any TLS client is built
    let _ = rustls::crypto::ring::default_provider().install_default();

    info!("Starting JumpServer Pod Sync Controller");

    let config = SyncConfig::try_from(Cli::parse())?;

    info!("Configuration:");
    info!("  JumpServer URL: {}", config.jumpserver_url);
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Label selector: {}", config.label_selector);
    info!("  SSH port prefix: {}", config.ssh_port_name_prefix);
    info!("  Sync interval: {:?}", config.interval);
    info!("  Principal: {}", config.principal.as_deref().unwrap_or("none"));

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
