//! Process configuration.
//!
//! Every option is a command-line flag with an environment-variable
//! fallback. `SyncConfig::try_from` validates and normalizes the raw flags
//! once at startup; any violation is fatal before the controller connects
//! to anything.

use crate::error::ControllerError;
use clap::Parser;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Fixed API path segment appended to the JumpServer host
pub const API_PATH: &str = "/api/v1";

/// Command-line flags
#[derive(Parser)]
#[command(name = "jms-pod-sync")]
#[command(about = "Keeps JumpServer assets in sync with SSH-capable Kubernetes pods", long_about = None)]
#[command(version)]
pub struct Cli {
    /// JumpServer host (e.g. jumpserver.example.com)
    #[arg(long, env = "JMS_HOST")]
    pub host: Option<String>,

    /// JumpServer user
    #[arg(long, env = "JMS_USERNAME")]
    pub username: Option<String>,

    /// JumpServer password
    #[arg(long, env = "JMS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Namespace to discover pods in (empty for all namespaces)
    #[arg(long, env = "WATCH_NAMESPACE", default_value = "")]
    pub namespace: String,

    /// Label selector for pods exposing SSH
    #[arg(long, env = "POD_LABEL_SELECTOR", default_value = "ssh.port/open=true")]
    pub label: String,

    /// Container port names starting with this prefix are SSH ports
    #[arg(long, env = "SSH_PORT_NAME_PREFIX", default_value = "ssh")]
    pub ssh_port_name_prefix: String,

    /// Liveness endpoint listen address (":8080" binds all interfaces)
    #[arg(long, env = "LISTEN_ADDR", default_value = ":8080")]
    pub listen_addr: String,

    /// Seconds between reconciliation cycles
    #[arg(long, env = "SYNC_INTERVAL_SECS", default_value_t = 60)]
    pub interval_secs: u64,

    /// Kubeconfig file used when in-cluster credentials are unavailable.
    /// Unset falls back to the standard `KUBECONFIG` list, then
    /// $HOME/.kube/config
    #[arg(long, env = "JMS_POD_SYNC_KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// JumpServer user every created asset is bound to
    #[arg(long, env = "JMS_ASSET_PRINCIPAL")]
    pub principal: Option<String>,

    /// JumpServer admin user attached to created assets
    #[arg(long, env = "JMS_ADMIN_USER")]
    pub admin_user: Option<String>,

    /// Platform tag of created assets
    #[arg(long, env = "JMS_ASSET_PLATFORM", default_value = "Linux")]
    pub platform: String,

    /// Time bound, in seconds, on every call to Kubernetes or JumpServer
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Asset creations/deletions run concurrently per cycle (1 = sequential)
    #[arg(long, env = "MAX_CONCURRENT_OPS", default_value_t = 4)]
    pub max_concurrent_ops: usize,
}

/// Validated configuration, built once and handed to every component.
#[derive(Clone)]
pub struct SyncConfig {
    /// JumpServer API base URL, always ending in `/api/v1`
    pub jumpserver_url: String,
    pub username: String,
    pub password: String,
    /// `None` means all namespaces
    pub namespace: Option<String>,
    pub label_selector: String,
    pub ssh_port_name_prefix: String,
    pub listen_addr: SocketAddr,
    pub interval: Duration,
    pub kubeconfig: Option<PathBuf>,
    pub principal: Option<String>,
    pub admin_user: Option<String>,
    pub platform: String,
    pub request_timeout: Duration,
    pub max_concurrent_ops: usize,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("jumpserver_url", &self.jumpserver_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("namespace", &self.namespace)
            .field("label_selector", &self.label_selector)
            .field("ssh_port_name_prefix", &self.ssh_port_name_prefix)
            .field("listen_addr", &self.listen_addr)
            .field("interval", &self.interval)
            .field("kubeconfig", &self.kubeconfig)
            .field("principal", &self.principal)
            .field("admin_user", &self.admin_user)
            .field("platform", &self.platform)
            .field("request_timeout", &self.request_timeout)
            .field("max_concurrent_ops", &self.max_concurrent_ops)
            .finish()
    }
}

impl TryFrom<Cli> for SyncConfig {
    type Error = ControllerError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let host = required(cli.host, "host")?;
        let username = required(cli.username, "username")?;
        let password = required(cli.password, "password")?;

        if cli.ssh_port_name_prefix.is_empty() {
            return Err(ControllerError::InvalidConfig(
                "ssh-port-name-prefix can not be empty".to_string(),
            ));
        }
        if cli.interval_secs == 0 {
            return Err(ControllerError::InvalidConfig(
                "interval-secs must be greater than zero".to_string(),
            ));
        }
        if cli.request_timeout_secs == 0 {
            return Err(ControllerError::InvalidConfig(
                "request-timeout-secs must be greater than zero".to_string(),
            ));
        }
        if cli.max_concurrent_ops == 0 {
            return Err(ControllerError::InvalidConfig(
                "max-concurrent-ops must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            jumpserver_url: normalize_host(&host)?,
            username,
            password,
            namespace: Some(cli.namespace).filter(|ns| !ns.is_empty()),
            label_selector: cli.label,
            ssh_port_name_prefix: cli.ssh_port_name_prefix,
            listen_addr: parse_listen_addr(&cli.listen_addr)?,
            interval: Duration::from_secs(cli.interval_secs),
            kubeconfig: cli.kubeconfig.filter(|p| !p.as_os_str().is_empty()),
            principal: cli.principal.filter(|p| !p.is_empty()),
            admin_user: cli.admin_user.filter(|a| !a.is_empty()),
            platform: cli.platform,
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            max_concurrent_ops: cli.max_concurrent_ops,
        })
    }
}

fn required(value: Option<String>, flag: &str) -> Result<String, ControllerError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ControllerError::InvalidConfig(format!("{} can not be empty", flag)))
}

/// Turn a bare host into the JumpServer API base URL: `http://` is added
/// when no scheme is given and the `/api/v1` segment is appended once.
pub fn normalize_host(host: &str) -> Result<String, ControllerError> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(ControllerError::InvalidConfig("host can not be empty".to_string()));
    }

    let mut url = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    };
    if !url.ends_with(API_PATH) {
        url.push_str(API_PATH);
    }
    Ok(url)
}

/// Parse a listen address; `:PORT` binds every interface.
pub fn parse_listen_addr(addr: &str) -> Result<SocketAddr, ControllerError> {
    let full = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };
    full.parse()
        .map_err(|e| ControllerError::InvalidConfig(format!("Invalid listen address {}: {}", addr, e)))
}
