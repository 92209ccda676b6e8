//! Test utilities for unit testing the reconciler
//!
//! Helpers for building workloads and assets and for wiring a `Reconciler`
//! to in-memory collaborators.

use crate::asset::{ActualAsset, DesiredAsset, Workload, WorkloadContainer, WorkloadPort};
use crate::error::ControllerError;
use crate::gateway::GatewayInventory;
use crate::identity::AssetIdentity;
use crate::reconciler::Reconciler;
use crate::source::{SourceInventory, WorkloadSource};
use async_trait::async_trait;
use jumpserver_client::MockJumpServerClient;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// `WorkloadSource` serving a fixed, replaceable list of workloads
#[derive(Default)]
pub struct StaticWorkloadSource {
    workloads: Mutex<Vec<Workload>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl StaticWorkloadSource {
    pub fn new(workloads: Vec<Workload>) -> Self {
        Self {
            workloads: Mutex::new(workloads),
            ..Default::default()
        }
    }

    pub fn set_workloads(&self, workloads: Vec<Workload>) {
        *self.workloads.lock().unwrap() = workloads;
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkloadSource for StaticWorkloadSource {
    async fn list_workloads(
        &self,
        _namespace: Option<&str>,
        _selector: &str,
        _max_results: u32,
    ) -> Result<Vec<Workload>, ControllerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ControllerError::Timeout("injected listing failure".to_string()));
        }
        Ok(self.workloads.lock().unwrap().clone())
    }
}

/// Builder for test workloads
pub struct WorkloadBuilder {
    workload: Workload,
}

impl WorkloadBuilder {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            workload: Workload {
                namespace: namespace.to_string(),
                name: name.to_string(),
                address: None,
                containers: Vec::new(),
            },
        }
    }

    pub fn address(mut self, address: &str) -> Self {
        self.workload.address = Some(address.to_string());
        self
    }

    pub fn container(mut self, name: &str, ports: &[(&str, u16)]) -> Self {
        self.workload.containers.push(WorkloadContainer {
            name: name.to_string(),
            ports: ports
                .iter()
                .map(|(port_name, number)| WorkloadPort {
                    name: port_name.to_string(),
                    number: *number,
                })
                .collect(),
        });
        self
    }

    pub fn build(self) -> Workload {
        self.workload
    }
}

/// Desired SSH asset on port 22 from workload `default/<workload>`
pub fn desired(workload: &str, container: &str, port_name: &str, address: &str) -> DesiredAsset {
    let source = format!("default/{}", workload);
    DesiredAsset {
        identity: AssetIdentity::new(workload, container, port_name),
        address: address.to_string(),
        port: 22,
        platform: "Linux".to_string(),
        comment: format!("managed-by=jms-pod-sync pod={}", source),
        source,
    }
}

/// Managed gateway asset with a made-up id
pub fn actual(workload: &str, container: &str, port_name: &str) -> ActualAsset {
    let identity = AssetIdentity::new(workload, container, port_name);
    ActualAsset {
        id: format!("id-{}", identity),
        identity,
        address: "10.0.0.1".to_string(),
        port: 22,
    }
}

/// Reconciler over a static source and a mock JumpServer
pub fn test_reconciler(
    source: Arc<StaticWorkloadSource>,
    mock: &MockJumpServerClient,
    principal: Option<&str>,
    max_concurrent_ops: usize,
) -> Reconciler {
    let timeout = Duration::from_secs(5);
    let source = SourceInventory::new(
        source,
        None,
        "ssh.port/open=true".to_string(),
        "ssh".to_string(),
        "Linux".to_string(),
        timeout,
    );
    let gateway = GatewayInventory::new(Arc::new(mock.clone()), None, timeout);
    Reconciler::new(source, gateway, principal.map(str::to_string), max_concurrent_ops)
}
