//! Periodic reconciliation loop.

use crate::reconciler::{CycleReport, Reconciler};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Runs one cycle, sleeps a fixed interval, repeats until shutdown.
pub struct Scheduler {
    reconciler: Arc<Reconciler>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(reconciler: Arc<Reconciler>, interval: Duration) -> Self {
        Self { reconciler, interval }
    }

    /// Loop until `shutdown` turns true or its sender is dropped. A failed
    /// cycle is logged and the loop carries on. Returns the number of cycles
    /// run, failed ones included.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> u64 {
        info!(interval = ?self.interval, "Starting reconciliation loop");
        let mut completed = 0u64;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                result = self.reconciler.reconcile_once() => {
                    completed += 1;
                    match result {
                        Ok(report) => log_report(&report),
                        Err(e) => error!(error = %e, "Reconciliation cycle aborted"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("Shutdown requested, abandoning in-flight cycle");
                    break;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(cycles = completed, "Reconciliation loop stopped");
        completed
    }
}

fn log_report(report: &CycleReport) {
    let elapsed_ms = (chrono::Utc::now() - report.started_at).num_milliseconds();
    if report.is_partial() {
        warn!(
            started_at = %report.started_at,
            elapsed_ms,
            created = report.created,
            conflicts = report.conflicts,
            create_failed = report.create_failed,
            bound = report.bound,
            bind_failed = report.bind_failed,
            deleted = report.deleted,
            already_absent = report.already_absent,
            delete_failed = report.delete_failed,
            "Reconciliation cycle partially failed; failed items retry next cycle"
        );
    } else {
        info!(
            started_at = %report.started_at,
            elapsed_ms,
            created = report.created,
            conflicts = report.conflicts,
            bound = report.bound,
            deleted = report.deleted,
            already_absent = report.already_absent,
            "Reconciliation cycle complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{StaticWorkloadSource, WorkloadBuilder, test_reconciler};
    use jumpserver_client::MockJumpServerClient;

    fn scheduler(source: Arc<StaticWorkloadSource>, mock: &MockJumpServerClient) -> Scheduler {
        Scheduler::new(Arc::new(test_reconciler(source, mock, None, 4)), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_a_cycle_per_interval() {
        let mock = MockJumpServerClient::new("http://jms/api/v1");
        let source = Arc::new(StaticWorkloadSource::new(Vec::new()));
        let scheduler = scheduler(source.clone(), &mock);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { scheduler.run(rx).await });
        // Cycles start at t=0, 60 and 120
        tokio::time::sleep(Duration::from_secs(150)).await;
        tx.send(true).unwrap();

        assert_eq!(handle.await.unwrap(), 3);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycles_do_not_stop_the_loop() {
        let mock = MockJumpServerClient::new("http://jms/api/v1");
        let source = Arc::new(StaticWorkloadSource::new(vec![
            WorkloadBuilder::new("default", "pod-a")
                .address("10.0.0.1")
                .container("web", &[("ssh", 22)])
                .build(),
        ]));
        mock.set_fail_listing(true);
        let scheduler = scheduler(source.clone(), &mock);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { scheduler.run(rx).await });
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert!(mock.hostnames().is_empty());

        // Gateway recovers; the next cycle converges
        mock.set_fail_listing(false);
        tokio::time::sleep(Duration::from_secs(60)).await;
        tx.send(true).unwrap();

        assert_eq!(handle.await.unwrap(), 3);
        assert_eq!(mock.hostnames(), vec!["pod-a__web__ssh"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_sleep() {
        let mock = MockJumpServerClient::new("http://jms/api/v1");
        let source = Arc::new(StaticWorkloadSource::new(Vec::new()));
        let scheduler = Scheduler::new(
            Arc::new(test_reconciler(source, &mock, None, 4)),
            Duration::from_secs(3600),
        );
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { scheduler.run(rx).await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        tx.send(true).unwrap();

        let cycles = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert_eq!(cycles, 1);
    }

    #[tokio::test]
    async fn test_already_shut_down_runs_nothing() {
        let mock = MockJumpServerClient::new("http://jms/api/v1");
        let source = Arc::new(StaticWorkloadSource::new(Vec::new()));
        let (_tx, rx) = watch::channel(true);

        assert_eq!(scheduler(source.clone(), &mock).run(rx).await, 0);
        assert_eq!(source.calls(), 0);
    }
}
