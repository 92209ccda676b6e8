//! Stable asset identity.
//!
//! An identity names one SSH endpoint: the workload (pod), the container
//! inside it, and the named port. It is used verbatim as the JumpServer
//! asset hostname, which is how the controller recognizes assets it owns.

use std::fmt;

/// Joins the identity segments. Kubernetes object and port names never
/// contain `_`, so the encoding stays unambiguous.
pub const IDENTITY_SEPARATOR: &str = "__";

/// `<workload>__<container>__<port-name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetIdentity(String);

impl AssetIdentity {
    pub fn new(workload: &str, container: &str, port_name: &str) -> Self {
        Self(format!(
            "{workload}{sep}{container}{sep}{port_name}",
            sep = IDENTITY_SEPARATOR
        ))
    }

    /// Recover an identity from an asset hostname. Returns `None` for
    /// hostnames this controller could not have produced.
    pub fn parse(hostname: &str) -> Option<Self> {
        let parts: Vec<&str> = hostname.split(IDENTITY_SEPARATOR).collect();
        let well_formed = parts.len() == 3
            && parts.iter().all(|p| !p.is_empty() && !p.contains('_'));
        well_formed.then(|| Self(hostname.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `(workload, container, port_name)`
    pub fn parts(&self) -> (&str, &str, &str) {
        let mut it = self.0.splitn(3, IDENTITY_SEPARATOR);
        let workload = it.next().unwrap_or_default();
        let container = it.next().unwrap_or_default();
        let port = it.next().unwrap_or_default();
        (workload, container, port)
    }
}

impl fmt::Display for AssetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
