//! Executes a plan against the gateway.
//!
//! Each creation and deletion is an independent unit: a failure is logged
//! and counted, and the remaining items still run.

use super::plan::ReconcilePlan;
use crate::asset::{ActualAsset, DesiredAsset};
use crate::gateway::{CreateOutcome, DeleteOutcome, GatewayInventory};
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use tracing::{error, info, warn};

/// Counts for one reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub desired: usize,
    pub actual: usize,
    /// Gateway assets outside the managed scope
    pub foreign: usize,
    pub stable: usize,
    pub to_create: usize,
    pub to_delete: usize,
    pub skipped: usize,
    pub created: usize,
    pub conflicts: usize,
    pub create_failed: usize,
    pub bound: usize,
    pub bind_failed: usize,
    pub deleted: usize,
    pub already_absent: usize,
    pub delete_failed: usize,
}

impl CycleReport {
    pub fn new(started_at: DateTime<Utc>, plan: &ReconcilePlan, foreign: usize) -> Self {
        Self {
            started_at,
            desired: plan.desired_count,
            actual: plan.actual_count,
            foreign,
            stable: plan.stable.len(),
            to_create: plan.to_create.len(),
            to_delete: plan.to_delete.len(),
            skipped: plan.skipped.len(),
            created: 0,
            conflicts: 0,
            create_failed: 0,
            bound: 0,
            bind_failed: 0,
            deleted: 0,
            already_absent: 0,
            delete_failed: 0,
        }
    }

    /// At least one item failed; the next cycle retries it.
    ///
    /// An asset whose principal bind failed is removed again, so it is
    /// planned for creation on the next cycle.
    pub fn is_partial(&self) -> bool {
        self.create_failed + self.bind_failed + self.delete_failed > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CreateResult {
    Created { bound: bool },
    Conflict,
    Failed,
    BindFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeleteResult {
    Deleted,
    AlreadyAbsent,
    Failed,
}

async fn create_one(gateway: &GatewayInventory, principal: Option<&str>, asset: &DesiredAsset) -> CreateResult {
    let id = match gateway.create_asset(asset).await {
        Ok(CreateOutcome::Created(id)) => id,
        Ok(CreateOutcome::AlreadyExists) => {
            warn!(identity = %asset.identity, "Asset already exists, leaving it as is");
            return CreateResult::Conflict;
        }
        Err(e) => {
            error!(identity = %asset.identity, error = %e, "Failed to create asset");
            return CreateResult::Failed;
        }
    };
    info!(identity = %asset.identity, id = %id, address = %asset.address, port = asset.port, "Created asset");

    let Some(principal) = principal else {
        return CreateResult::Created { bound: false };
    };
    match gateway.bind_asset_to_principal(principal, &id).await {
        Ok(()) => {
            info!(identity = %asset.identity, principal, "Bound asset to principal");
            CreateResult::Created { bound: true }
        }
        Err(e) => {
            error!(identity = %asset.identity, principal, error = %e, "Failed to bind asset to principal");
            roll_back(gateway, asset).await;
            CreateResult::BindFailed
        }
    }
}

/// Remove an asset whose bind failed so the next cycle creates it again.
async fn roll_back(gateway: &GatewayInventory, asset: &DesiredAsset) {
    match gateway.delete_asset(&asset.identity).await {
        Ok(DeleteOutcome::Deleted) => {
            info!(identity = %asset.identity, "Rolled back unbound asset");
        }
        Ok(DeleteOutcome::AlreadyAbsent) => {
            warn!(identity = %asset.identity, "Unbound asset already removed");
        }
        Err(e) => {
            error!(
                identity = %asset.identity,
                error = %e,
                "Failed to roll back unbound asset; it stays unbound until removed"
            );
        }
    }
}

async fn delete_one(gateway: &GatewayInventory, asset: &ActualAsset) -> DeleteResult {
    match gateway.delete_asset(&asset.identity).await {
        Ok(DeleteOutcome::Deleted) => {
            let (pod, container, _) = asset.identity.parts();
            info!(
                identity = %asset.identity,
                id = %asset.id,
                pod,
                container,
                address = %asset.address,
                port = asset.port,
                "Deleted asset"
            );
            DeleteResult::Deleted
        }
        Ok(DeleteOutcome::AlreadyAbsent) => {
            warn!(identity = %asset.identity, "Asset already removed");
            DeleteResult::AlreadyAbsent
        }
        Err(e) => {
            error!(identity = %asset.identity, error = %e, "Failed to delete asset");
            DeleteResult::Failed
        }
    }
}

/// Drive `run` over `items` with at most `limit` futures in flight.
pub(super) async fn bounded<'a, T, R, F, Fut>(items: &'a [T], limit: usize, run: F) -> Vec<R>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = R>,
{
    let mut pending = items.iter();
    let mut in_flight = pending
        .by_ref()
        .take(limit.max(1))
        .map(&run)
        .collect::<FuturesUnordered<_>>();
    let mut results = Vec::with_capacity(items.len());
    while let Some(result) = in_flight.next().await {
        results.push(result);
        if let Some(item) = pending.next() {
            in_flight.push(run(item));
        }
    }
    results
}

/// Run every creation, then every deletion, at most `concurrency` at a time.
pub async fn apply(
    gateway: &GatewayInventory,
    principal: Option<&str>,
    plan: &ReconcilePlan,
    concurrency: usize,
    report: &mut CycleReport,
) {
    let created = bounded(&plan.to_create, concurrency, |asset| create_one(gateway, principal, asset)).await;
    for result in created {
        match result {
            CreateResult::Created { bound } => {
                report.created += 1;
                if bound {
                    report.bound += 1;
                }
            }
            CreateResult::Conflict => report.conflicts += 1,
            CreateResult::Failed => report.create_failed += 1,
            CreateResult::BindFailed => report.bind_failed += 1,
        }
    }

    let deleted = bounded(&plan.to_delete, concurrency, |asset| delete_one(gateway, asset)).await;
    for result in deleted {
        match result {
            DeleteResult::Deleted => report.deleted += 1,
            DeleteResult::AlreadyAbsent => report.already_absent += 1,
            DeleteResult::Failed => report.delete_failed += 1,
        }
    }
}
