//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the collaborators
//! together at startup and runs the two long-lived activities: the
//! reconciliation scheduler and the liveness endpoint.

use crate::config::SyncConfig;
use crate::error::ControllerError;
use crate::gateway::{GatewayInventory, prepare_gateway};
use crate::health;
use crate::reconciler::Reconciler;
use crate::scheduler::Scheduler;
use crate::source::{KubeWorkloadSource, SourceInventory};
use jumpserver_client::JumpServerClient;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Main controller for pod to asset synchronization.
pub struct Controller {
    scheduler: Scheduler,
    listen_addr: SocketAddr,
}

impl Controller {
    /// Connect to both systems and run the startup checks. Any failure here
    /// is fatal.
    pub async fn new(config: SyncConfig) -> Result<Self, ControllerError> {
        info!("Initializing pod-sync controller");

        let kube_client = build_kube_client(config.kubeconfig.as_deref()).await?;

        let jumpserver_client = JumpServerClient::new(
            config.jumpserver_url.clone(),
            config.username.clone(),
            config.password.clone(),
            config.request_timeout,
        )?;
        let admin_user_id = prepare_gateway(&jumpserver_client, &config).await.map_err(|e| {
            error!("JumpServer startup checks failed: {}", e);
            error!("Please ensure:");
            error!("  1. JMS_USERNAME and JMS_PASSWORD are correct");
            error!("  2. JumpServer is reachable at {}", config.jumpserver_url);
            error!("  3. JMS_ADMIN_USER and JMS_ASSET_PRINCIPAL, when set, exist in JumpServer");
            e
        })?;

        let source = SourceInventory::new(
            Arc::new(KubeWorkloadSource::new(kube_client)),
            config.namespace.clone(),
            config.label_selector.clone(),
            config.ssh_port_name_prefix.clone(),
            config.platform.clone(),
            config.request_timeout,
        );
        let gateway = GatewayInventory::new(
            Arc::new(jumpserver_client),
            admin_user_id,
            config.request_timeout,
        );
        let reconciler = Reconciler::new(
            source,
            gateway,
            config.principal.clone(),
            config.max_concurrent_ops,
        );

        Ok(Self {
            scheduler: Scheduler::new(Arc::new(reconciler), config.interval),
            listen_addr: config.listen_addr,
        })
    }

    /// Run until SIGINT/SIGTERM, or until the liveness server fails.
    pub async fn run(self) -> Result<(), ControllerError> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let scheduler = self.scheduler;
        let scheduler_rx = shutdown_rx.clone();
        let mut scheduler_task = tokio::spawn(async move { scheduler.run(scheduler_rx).await });
        let mut health_task = tokio::spawn(health::serve(self.listen_addr, shutdown_rx));

        info!("Controller running");

        let mut health_result = None;
        tokio::select! {
            _ = shutdown_signal() => {}
            result = &mut health_task => {
                health_result = Some(result);
            }
            result = &mut scheduler_task => {
                warn!("Reconciliation loop exited unexpectedly: {:?}", result);
            }
        }

        let _ = shutdown_tx.send(true);

        let health_result = match health_result {
            Some(result) => result,
            None => health_task.await,
        };
        if !scheduler_task.is_finished() {
            match scheduler_task.await {
                Ok(cycles) => info!(cycles, "Reconciliation loop drained"),
                Err(e) => error!("Reconciliation task failed: {}", e),
            }
        }

        info!("Controller stopped");
        health_result.map_err(|e| ControllerError::Server(e.to_string()))?
    }
}

/// In-cluster configuration first, then the kubeconfig.
async fn build_kube_client(kubeconfig: Option<&Path>) -> Result<Client, ControllerError> {
    let config = match Config::incluster() {
        Ok(config) => {
            info!("Using in-cluster Kubernetes configuration");
            config
        }
        Err(in_cluster_err) => {
            info!(error = %in_cluster_err, "Not running in a cluster, loading kubeconfig");
            let kubeconfig = load_kubeconfig(kubeconfig)?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| ControllerError::InvalidConfig(format!("invalid kubeconfig: {}", e)))?
        }
    };
    Ok(Client::try_from(config)?)
}

/// An explicit path is read as a single file. Otherwise the `KUBECONFIG`
/// list is merged, falling back to $HOME/.kube/config.
fn load_kubeconfig(path: Option<&Path>) -> Result<Kubeconfig, ControllerError> {
    match path {
        Some(path) => {
            info!("Using kubeconfig {}", path.display());
            Kubeconfig::read_from(path).map_err(|e| {
                ControllerError::InvalidConfig(format!("cannot read kubeconfig {}: {}", path.display(), e))
            })
        }
        None => Kubeconfig::read()
            .map_err(|e| ControllerError::InvalidConfig(format!("cannot load kubeconfig: {}", e))),
    }
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
