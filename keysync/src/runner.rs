//! Cycle runner - drives an integration through setup and repeated
//! reconciliation cycles until shutdown.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::inventory::ResourceInventory;
use crate::reconciler::{Change, ChangeKind, CycleContext, Integration};

/// How the runner schedules cycles.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Log the diff instead of applying it.
    pub dry_run: bool,
    /// Stop after the first cycle.
    pub run_once: bool,
    /// Pause between cycles.
    pub interval: Duration,
}

/// Outcome of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub dry_run: bool,
    /// Entries in the inventory.
    pub resources: usize,
    /// Applied changes, or planned ones in a dry run.
    pub changes: Vec<Change>,
}

impl CycleReport {
    pub fn upserts(&self) -> usize {
        self.count(ChangeKind::Upsert)
    }

    pub fn deletes(&self) -> usize {
        self.count(ChangeKind::Delete)
    }

    fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }
}

/// Runs an integration. Cycles are strictly sequential.
pub struct Runner<I> {
    integration: I,
    options: RunnerOptions,
    cycles: u64,
}

impl<I: Integration> Runner<I> {
    pub fn new(integration: I, options: RunnerOptions) -> Self {
        Self {
            integration,
            options,
            cycles: 0,
        }
    }

    /// Set up, then cycle until `shutdown` is cancelled (or once, if
    /// configured). Failed cycles are logged and retried on the next tick;
    /// in run-once mode the failure is returned. A cycle interrupted by
    /// shutdown ends the run cleanly.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        info!(
            integration = self.integration.name(),
            dry_run = self.options.dry_run,
            "Starting runner"
        );
        self.integration.setup().await?;

        loop {
            match self.run_cycle(shutdown.child_token()).await {
                Ok(report) => info!(
                    cycle = report.cycle,
                    resources = report.resources,
                    upserts = report.upserts(),
                    deletes = report.deletes(),
                    dry_run = report.dry_run,
                    "Cycle complete"
                ),
                Err(Error::Cancelled) => {
                    info!(cycle = self.cycles, "Cycle cancelled, stopping runner");
                    return Ok(());
                }
                Err(e) if self.options.run_once => return Err(e),
                Err(e) => error!(cycle = self.cycles, error = %e, "Cycle failed"),
            }

            if self.options.run_once {
                return Ok(());
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, stopping runner");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.options.interval) => {}
            }
        }
    }

    /// One full cycle: collect current and desired state into a fresh
    /// inventory, then log or apply the diff.
    pub async fn run_cycle(&mut self, cancel: CancellationToken) -> Result<CycleReport> {
        self.cycles += 1;
        let ctx = CycleContext::new(self.cycles, cancel);
        let mut inventory = ResourceInventory::new();

        self.integration
            .current_state(&ctx, &mut inventory)
            .await?;
        self.integration
            .desired_state(&ctx, &mut inventory)
            .await?;

        let changes = if self.options.dry_run {
            self.integration.log_diff(&ctx, &inventory)
        } else {
            self.integration.reconcile(&ctx, &inventory).await?
        };

        Ok(CycleReport {
            cycle: ctx.cycle,
            dry_run: self.options.dry_run,
            resources: inventory.len(),
            changes,
        })
    }
}
