//! Source inventory: SSH-capable pods discovered in Kubernetes.

use crate::asset::{DesiredAsset, Workload, WorkloadContainer, WorkloadPort};
use crate::error::{ControllerError, bounded};
use crate::identity::AssetIdentity;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::{Api, Client};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Page size large enough that one request returns every matching pod.
pub const MAX_WORKLOADS: u32 = 65535;

/// Lists running workloads. Implemented over the Kubernetes API in
/// production and over a fixed list in tests.
#[async_trait]
pub trait WorkloadSource: Send + Sync {
    /// `namespace = None` lists across all namespaces.
    async fn list_workloads(
        &self,
        namespace: Option<&str>,
        selector: &str,
        max_results: u32,
    ) -> Result<Vec<Workload>, ControllerError>;
}

/// `WorkloadSource` backed by the Kubernetes pods API.
pub struct KubeWorkloadSource {
    client: Client,
}

impl KubeWorkloadSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WorkloadSource for KubeWorkloadSource {
    async fn list_workloads(
        &self,
        namespace: Option<&str>,
        selector: &str,
        max_results: u32,
    ) -> Result<Vec<Workload>, ControllerError> {
        let api: Api<Pod> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };

        let mut params = ListParams::default().limit(max_results);
        if !selector.is_empty() {
            params = params.labels(selector);
        }

        let pods = api.list(&params).await?;
        if pods.metadata.continue_.as_deref().is_some_and(|c| !c.is_empty()) {
            warn!(limit = max_results, "Pod listing was truncated; pods past the limit are ignored this cycle");
        }
        Ok(pods.items.iter().filter_map(pod_to_workload).collect())
    }
}

/// Project a pod onto the fields reconciliation needs. Pods without a name
/// are dropped; ports without a name or outside the u16 range are skipped.
pub fn pod_to_workload(pod: &Pod) -> Option<Workload> {
    let name = pod.metadata.name.clone()?;
    let namespace = pod.metadata.namespace.clone().unwrap_or_default();
    let address = pod
        .status
        .as_ref()
        .and_then(|s| s.pod_ip.clone())
        .filter(|ip| !ip.is_empty());

    let containers = pod
        .spec
        .as_ref()
        .map(|spec| {
            spec.containers
                .iter()
                .map(|c| WorkloadContainer {
                    name: c.name.clone(),
                    ports: c
                        .ports
                        .iter()
                        .flatten()
                        .filter_map(|p| {
                            let port_name = p.name.clone()?;
                            let number = u16::try_from(p.container_port).ok()?;
                            Some(WorkloadPort { name: port_name, number })
                        })
                        .collect(),
                })
                .collect()
        })
        .unwrap_or_default();

    Some(Workload {
        namespace,
        name,
        address,
        containers,
    })
}

/// One desired asset per container port whose name starts with `prefix`.
/// Workloads without a matching port contribute nothing.
pub fn desired_assets(workloads: &[Workload], prefix: &str, platform: &str) -> Vec<DesiredAsset> {
    let mut assets = Vec::new();
    for workload in workloads {
        let source = workload.source();
        for container in &workload.containers {
            for port in container.ports.iter().filter(|p| p.name.starts_with(prefix)) {
                assets.push(DesiredAsset {
                    identity: AssetIdentity::new(&workload.name, &container.name, &port.name),
                    address: workload.address.clone().unwrap_or_default(),
                    port: port.number,
                    platform: platform.to_string(),
                    comment: format!("managed-by=jms-pod-sync pod={}", source),
                    source: source.clone(),
                });
            }
        }
    }
    assets
}

/// Source Inventory Adapter: lists workloads and projects their SSH ports.
pub struct SourceInventory {
    source: Arc<dyn WorkloadSource>,
    namespace: Option<String>,
    selector: String,
    prefix: String,
    platform: String,
    timeout: Duration,
}

impl SourceInventory {
    pub fn new(
        source: Arc<dyn WorkloadSource>,
        namespace: Option<String>,
        selector: String,
        prefix: String,
        platform: String,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            namespace,
            selector,
            prefix,
            platform,
            timeout,
        }
    }

    pub async fn list_desired_assets(&self) -> Result<Vec<DesiredAsset>, ControllerError> {
        let workloads = bounded(
            self.timeout,
            "list workloads",
            self.source
                .list_workloads(self.namespace.as_deref(), &self.selector, MAX_WORKLOADS),
        )
        .await?;

        let assets = desired_assets(&workloads, &self.prefix, &self.platform);
        debug!(workloads = workloads.len(), endpoints = assets.len(), "Listed desired assets");
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{StaticWorkloadSource, WorkloadBuilder};
    use k8s_openapi::api::core::v1::{Container, ContainerPort, PodSpec, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn port(name: Option<&str>, number: i32) -> ContainerPort {
        ContainerPort {
            name: name.map(str::to_string),
            container_port: number,
            ..Default::default()
        }
    }

    #[test]
    fn test_only_prefixed_ports_become_assets() {
        let workloads = vec![
            WorkloadBuilder::new("default", "pod-x")
                .address("10.1.0.7")
                .container("shell", &[("ssh-main", 22), ("http", 80)])
                .build(),
        ];

        let assets = desired_assets(&workloads, "ssh", "Linux");
        assert_eq!(assets.len(), 1);
        let asset = &assets[0];
        assert_eq!(asset.identity.as_str(), "pod-x__shell__ssh-main");
        assert_eq!(asset.address, "10.1.0.7");
        assert_eq!(asset.port, 22);
        assert_eq!(asset.platform, "Linux");
        assert_eq!(asset.comment, "managed-by=jms-pod-sync pod=default/pod-x");
        assert_eq!(asset.source, "default/pod-x");
    }

    #[test]
    fn test_workload_without_ssh_port_is_excluded() {
        let workloads = vec![
            WorkloadBuilder::new("default", "web")
                .address("10.1.0.8")
                .container("nginx", &[("http", 80)])
                .build(),
        ];
        assert!(desired_assets(&workloads, "ssh", "Linux").is_empty());
    }

    #[test]
    fn test_unaddressed_workload_still_yields_asset() {
        let workloads = vec![
            WorkloadBuilder::new("default", "pending")
                .container("shell", &[("ssh", 22)])
                .build(),
        ];
        let assets = desired_assets(&workloads, "ssh", "Linux");
        assert_eq!(assets.len(), 1);
        assert!(assets[0].address.is_empty());
    }

    #[test]
    fn test_every_matching_port_of_every_container() {
        let workloads = vec![
            WorkloadBuilder::new("default", "multi")
                .address("10.1.0.9")
                .container("a", &[("ssh", 22), ("ssh-alt", 2222)])
                .container("b", &[("ssh", 22)])
                .build(),
        ];
        let mut ids: Vec<_> = desired_assets(&workloads, "ssh", "Linux")
            .into_iter()
            .map(|a| a.identity.to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["multi__a__ssh", "multi__a__ssh-alt", "multi__b__ssh"]);
    }

    #[test]
    fn test_pod_to_workload_projection() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("pod-a".to_string()),
                namespace: Some("dev".to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "web".to_string(),
                    ports: Some(vec![port(Some("ssh"), 22), port(None, 8080), port(Some("ssh-big"), 70000)]),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            status: Some(PodStatus {
                pod_ip: Some(String::new()),
                ..Default::default()
            }),
        };

        let workload = pod_to_workload(&pod).unwrap();
        assert_eq!(workload.source(), "dev/pod-a");
        assert_eq!(workload.address, None);
        assert_eq!(
            workload.containers[0].ports,
            vec![WorkloadPort { name: "ssh".to_string(), number: 22 }]
        );
    }

    #[test]
    fn test_pod_without_name_is_dropped() {
        assert!(pod_to_workload(&Pod::default()).is_none());
    }

    #[tokio::test]
    async fn test_inventory_lists_through_source() {
        let source = Arc::new(StaticWorkloadSource::new(vec![
            WorkloadBuilder::new("default", "pod-a")
                .address("10.0.0.1")
                .container("web", &[("ssh", 22)])
                .build(),
        ]));
        let inventory = SourceInventory::new(
            source,
            None,
            "ssh.port/open=true".to_string(),
            "ssh".to_string(),
            "Linux".to_string(),
            Duration::from_secs(5),
        );

        let assets = inventory.list_desired_assets().await.unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].identity.as_str(), "pod-a__web__ssh");
    }

    #[tokio::test]
    async fn test_inventory_surfaces_listing_failure() {
        let source = Arc::new(StaticWorkloadSource::new(Vec::new()));
        source.set_fail(true);
        let inventory = SourceInventory::new(
            source,
            None,
            String::new(),
            "ssh".to_string(),
            "Linux".to_string(),
            Duration::from_secs(5),
        );
        assert!(inventory.list_desired_assets().await.is_err());
    }
}
