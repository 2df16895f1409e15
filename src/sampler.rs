//! Self-rescheduling sampling task that drives the refresh cycle.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::metrics::cpu::{CpuCounters, CpuUsageEstimator};
use crate::metrics::memory::MemoryInfo;
use crate::metrics::{process, MetricsSnapshot, SnapshotStore};

/// Periodic sampler that publishes a fresh snapshot each tick.
///
/// The CPU estimator state lives inside the task, so one cycle never races
/// another and readers never touch it.
pub struct Sampler {
    store: SnapshotStore,
    estimator: CpuUsageEstimator,
    interval: Duration,
}

impl Sampler {
    pub fn new(store: SnapshotStore, interval: Duration) -> Self {
        Self {
            store,
            estimator: CpuUsageEstimator::new(),
            interval,
        }
    }

    /// Spawn the sampling loop. The first cycle runs immediately so the
    /// store is primed before the first report.
    pub fn spawn(self) -> SamplerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        SamplerHandle { shutdown_tx, task }
    }

    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        // Ticks are scheduled relative to each tick's start; if a cycle
        // overruns the interval, the next tick fires immediately instead of
        // being skipped.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.sample_once(),
                _ = shutdown.changed() => break,
            }
        }
        debug!("sampler stopped");
    }

    /// One full acquisition cycle.
    ///
    /// A source failing degrades its field to zero for this cycle only; the
    /// cycle always completes and never stops the loop.
    fn sample_once(&mut self) {
        let (mem_total_mb, mem_free_mb) = match MemoryInfo::probe() {
            Ok(mem) => (mem.total_mb(), mem.free_mb()),
            Err(err) => {
                warn!("memory probe failed: {err}");
                (0, 0)
            }
        };

        let cpu_usage = match CpuCounters::read() {
            Ok(counters) => self.estimator.update(&counters),
            Err(err) => {
                warn!("cpu counters unavailable: {err}");
                0
            }
        };

        self.store.publish(MetricsSnapshot {
            mem_total_mb,
            mem_free_mb,
            cpu_usage,
            running_processes: process::running_count(),
        });
    }
}

/// Cancellation handle for a running sampler.
pub struct SamplerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SamplerHandle {
    /// Stop the loop and wait for any in-flight cycle to finish.
    ///
    /// No tick executes after this returns; consuming the handle makes a
    /// second shutdown unrepresentable.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}
