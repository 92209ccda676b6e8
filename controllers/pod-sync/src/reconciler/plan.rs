//! Set difference between desired and actual assets.
//!
//! Pure and deterministic: every collection is ordered by identity, so the
//! same inputs always produce the same plan.

use crate::asset::{ActualAsset, DesiredAsset};
use crate::identity::AssetIdentity;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Desired data that can not be registered as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataQualityWarning {
    /// More than one workload produced the same identity
    IdentityCollision {
        identity: AssetIdentity,
        sources: Vec<String>,
    },
    /// The workload has no address yet
    EmptyAddress { identity: AssetIdentity, source: String },
}

impl DataQualityWarning {
    pub fn identity(&self) -> &AssetIdentity {
        match self {
            Self::IdentityCollision { identity, .. } | Self::EmptyAddress { identity, .. } => identity,
        }
    }
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdentityCollision { identity, sources } => {
                write!(f, "{} is produced by several workloads: {}", identity, sources.join(", "))
            }
            Self::EmptyAddress { identity, source } => {
                write!(f, "{} from {} has no address yet", identity, source)
            }
        }
    }
}

/// What one cycle will do.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    /// Desired assets missing from the gateway, excluding skipped ones
    pub to_create: Vec<DesiredAsset>,
    /// Managed gateway assets no workload produces any more
    pub to_delete: Vec<ActualAsset>,
    /// Identities present on both sides; left untouched
    pub stable: BTreeSet<AssetIdentity>,
    /// Desired identities held back from creation
    pub skipped: BTreeSet<AssetIdentity>,
    pub warnings: Vec<DataQualityWarning>,
    /// Distinct desired identities
    pub desired_count: usize,
    /// Distinct actual identities
    pub actual_count: usize,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Compute creations and deletions by identity.
///
/// Field values of stable identities are not compared. Duplicate desired
/// identities collapse to one; if they come from different workloads the
/// collision is reported and the identity is held back from creation, but it
/// still counts as desired so an existing asset is kept.
pub fn plan(desired: &[DesiredAsset], actual: &[ActualAsset]) -> ReconcilePlan {
    let mut by_identity: BTreeMap<&AssetIdentity, Vec<&DesiredAsset>> = BTreeMap::new();
    for d in desired {
        by_identity.entry(&d.identity).or_default().push(d);
    }

    let mut actual_by_identity: BTreeMap<&AssetIdentity, &ActualAsset> = BTreeMap::new();
    for a in actual {
        actual_by_identity.entry(&a.identity).or_insert(a);
    }

    let mut result = ReconcilePlan {
        desired_count: by_identity.len(),
        actual_count: actual_by_identity.len(),
        ..Default::default()
    };

    for (identity, candidates) in &by_identity {
        let sources: BTreeSet<&str> = candidates.iter().map(|d| d.source.as_str()).collect();
        let collides = sources.len() > 1;
        if collides {
            result.warnings.push(DataQualityWarning::IdentityCollision {
                identity: (*identity).clone(),
                sources: sources.into_iter().map(str::to_string).collect(),
            });
        }

        if actual_by_identity.contains_key(identity) {
            result.stable.insert((*identity).clone());
            continue;
        }
        if collides {
            result.skipped.insert((*identity).clone());
            continue;
        }

        let chosen = candidates[0];
        if chosen.address.is_empty() {
            result.warnings.push(DataQualityWarning::EmptyAddress {
                identity: (*identity).clone(),
                source: chosen.source.clone(),
            });
            result.skipped.insert((*identity).clone());
            continue;
        }

        result.to_create.push(chosen.clone());
    }

    for (identity, asset) in &actual_by_identity {
        if !by_identity.contains_key(identity) {
            result.to_delete.push((*asset).clone());
        }
    }

    result
}
