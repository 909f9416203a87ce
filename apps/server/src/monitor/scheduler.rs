//! In-process scheduling for `serve` mode and on-demand sweeps.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::sweep::{SweepOutcome, SweepReport, Sweeper};

/// Shared handle that runs sweeps and remembers the latest report
#[derive(Clone)]
pub struct SweepMonitor {
    sweeper: Arc<Sweeper>,
    latest: Arc<RwLock<Option<SweepReport>>>,
}

impl SweepMonitor {
    pub fn new(sweeper: Sweeper) -> Self {
        Self {
            sweeper: Arc::new(sweeper),
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Runs a sweep as of the current time. Skipped runs do not replace the
    /// latest report.
    pub async fn run_now(&self) -> SweepReport {
        let report = self.sweeper.run(Utc::now()).await;
        if report.outcome != SweepOutcome::Skipped {
            *self.latest.write().await = Some(report.clone());
        }
        report
    }

    /// Report of the most recent sweep that was not skipped
    pub async fn latest(&self) -> Option<SweepReport> {
        self.latest.read().await.clone()
    }

    /// Spawns the periodic sweep loop. The first sweep runs immediately;
    /// ticks that fall due while a sweep is still running are dropped.
    pub fn spawn(&self, every: Duration) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            log::info!("Overstay sweep scheduled every {}s", every.as_secs());

            loop {
                ticker.tick().await;
                let report = monitor.run_now().await;
                if report.is_failure() {
                    log::warn!("Scheduled overstay sweep did not complete");
                }
            }
        })
    }
}
