//! Reconciliation engine.
//!
//! One cycle reads both inventories fresh, plans by identity and applies the
//! plan. Nothing is carried between cycles:
//! - `plan`: pure set difference with data-quality checks
//! - `apply`: per-item create/bind/delete with failure isolation

pub mod apply;
pub mod plan;


pub use apply::CycleReport;

use crate::error::ControllerError;
use crate::gateway::GatewayInventory;
use crate::source::SourceInventory;
use chrono::Utc;
use tracing::{info, warn};

/// Reconciles pods into JumpServer assets.
pub struct Reconciler {
    pub(crate) source: SourceInventory,
    pub(crate) gateway: GatewayInventory,
    pub(crate) principal: Option<String>,
    pub(crate) max_concurrent_ops: usize,
}

impl Reconciler {
    pub fn new(
        source: SourceInventory,
        gateway: GatewayInventory,
        principal: Option<String>,
        max_concurrent_ops: usize,
    ) -> Self {
        Self {
            source,
            gateway,
            principal,
            max_concurrent_ops,
        }
    }

    /// Run one cycle. Errors mean a listing failed and nothing was applied;
    /// per-item failures are reported in the returned `CycleReport`.
    pub async fn reconcile_once(&self) -> Result<CycleReport, ControllerError> {
        let started_at = Utc::now();

        let desired = self.source.list_desired_assets().await?;
        let actual = self.gateway.list_actual_assets().await?;

        let plan = plan::plan(&desired, &actual.assets);
        for warning in &plan.warnings {
            warn!(identity = %warning.identity(), "Data quality: {}", warning);
        }

        let mut report = CycleReport::new(started_at, &plan, actual.foreign);
        info!(
            desired = report.desired,
            actual = report.actual,
            foreign = report.foreign,
            stable = report.stable,
            to_create = report.to_create,
            to_delete = report.to_delete,
            skipped = report.skipped,
            "Planned reconciliation"
        );

        if !plan.is_noop() {
            apply::apply(
                &self.gateway,
                self.principal.as_deref(),
                &plan,
                self.max_concurrent_ops,
                &mut report,
            )
            .await;
        }

        Ok(report)
    }
}
