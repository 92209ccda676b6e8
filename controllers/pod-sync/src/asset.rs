//! Records exchanged between the source, the gateway and the reconciler.

use crate::identity::AssetIdentity;

/// A running workload (pod) as seen by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub namespace: String,
    pub name: String,
    /// Pod IP; `None` until the pod is scheduled and networked
    pub address: Option<String>,
    pub containers: Vec<WorkloadContainer>,
}

impl Workload {
    /// `<namespace>/<name>`
    pub fn source(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadContainer {
    pub name: String,
    pub ports: Vec<WorkloadPort>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadPort {
    pub name: String,
    pub number: u16,
}

/// An endpoint that should exist in JumpServer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredAsset {
    pub identity: AssetIdentity,
    /// Empty when the workload has no address yet
    pub address: String,
    pub port: u16,
    pub platform: String,
    pub comment: String,
    /// Workload this endpoint was derived from (`namespace/name`)
    pub source: String,
}

/// A managed asset currently present in JumpServer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualAsset {
    pub identity: AssetIdentity,
    /// JumpServer asset id
    pub id: String,
    pub address: String,
    pub port: u16,
}
