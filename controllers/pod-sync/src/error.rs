//! Controller-specific error types.
//!
//! This module defines error types specific to the pod-sync controller
//! that are not covered by upstream library errors.

use jumpserver_client::JumpServerError;
use kube::Error as KubeError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the pod-sync controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// JumpServer API error
    #[error("JumpServer error: {0}")]
    JumpServer(#[from] JumpServerError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An external call exceeded its time bound
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Liveness server failure
    #[error("Server error: {0}")]
    Server(String),

    /// I/O error (e.g. binding the listen address)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run `call`, failing with `ControllerError::Timeout` once `limit` elapses.
pub async fn bounded<T, E, F>(limit: Duration, what: &str, call: F) -> Result<T, ControllerError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ControllerError>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(ControllerError::Timeout(format!(
            "{} did not complete within {:?}",
            what, limit
        ))),
    }
}
