//! CPU utilization estimated from cumulative /proc/stat counters.
//!
//! The kernel only exposes totals-since-boot, so a usage percentage is
//! derived from how far the counters moved between two successive reads.

use std::io;

use thiserror::Error;

const PROC_STAT: &str = "/proc/stat";

/// Errors raised while acquiring the CPU accounting source.
#[derive(Debug, Error)]
pub enum CpuError {
    #[error("failed to read {PROC_STAT}: {0}")]
    Read(#[from] io::Error),

    #[error("failed to parse {PROC_STAT}: {0}")]
    Parse(String),
}

/// Cumulative CPU time counters since boot, in clock ticks.
///
/// Field order matches the aggregate `cpu` line of /proc/stat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuCounters {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuCounters {
    /// Read the aggregate counters, once per sampling cycle.
    pub fn read() -> Result<Self, CpuError> {
        let content = std::fs::read_to_string(PROC_STAT)?;
        Self::parse(&content)
    }

    /// Parse the aggregate `cpu ` line (not `cpu0`, `cpu1`, ...) out of
    /// /proc/stat contents.
    pub fn parse(content: &str) -> Result<Self, CpuError> {
        let line = content
            .lines()
            .find(|line| line.starts_with("cpu "))
            .ok_or_else(|| CpuError::Parse("no aggregate cpu line".to_string()))?;

        let mut fields = line.split_whitespace().skip(1);
        let mut next = || -> Result<u64, CpuError> {
            let raw = fields
                .next()
                .ok_or_else(|| CpuError::Parse(format!("cpu line too short: {line:?}")))?;
            raw.parse()
                .map_err(|_| CpuError::Parse(format!("bad counter value {raw:?}")))
        };

        Ok(Self {
            user: next()?,
            nice: next()?,
            system: next()?,
            idle: next()?,
            iowait: next()?,
            irq: next()?,
            softirq: next()?,
            steal: next()?,
        })
    }

    /// Idle time including I/O wait.
    pub fn idle_time(&self) -> u64 {
        self.idle + self.iowait
    }

    /// Sum of every accounted CPU-time category.
    pub fn total_time(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }
}

/// Delta-based usage estimator.
///
/// Holds the previously observed (idle, total) pair across sampling cycles.
/// The first call, and any call where the counters did not strictly advance
/// (wraparound, a restarted accounting source), reports 0% for that cycle.
/// The baseline resynchronizes on every successful reading, so one cycle of
/// bad input heals the estimate for the next.
#[derive(Debug, Default)]
pub struct CpuUsageEstimator {
    last: Option<Observed>,
}

#[derive(Debug, Clone, Copy)]
struct Observed {
    idle: u64,
    total: u64,
}

impl CpuUsageEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one counter reading and return whole-percent usage for this
    /// cycle. Integer division truncates toward zero; the result is within
    /// 0..=100 because the idle delta never exceeds the total delta.
    pub fn update(&mut self, counters: &CpuCounters) -> u8 {
        let idle = counters.idle_time();
        let total = counters.total_time();

        let usage = match self.last {
            Some(last) if total > last.total && idle > last.idle => {
                100 - 100 * (idle - last.idle) / (total - last.total)
            }
            _ => 0,
        };

        self.last = Some(Observed { idle, total });
        usage as u8
    }
}
