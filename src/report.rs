//! Human-readable rendering of the current snapshot.

use crate::metrics::MetricsSnapshot;

/// Format a snapshot as labeled lines.
///
/// Always succeeds and has no side effects; before the first sampling cycle
/// completes this renders the zero-valued default snapshot. Refresh cadence
/// belongs to the sampler, not to report requests.
pub fn render(snapshot: &MetricsSnapshot) -> String {
    format!(
        "System information:\n\
         Total memory: {} MB\n\
         Free memory: {} MB\n\
         CPU usage: {}%\n\
         Running processes: {}\n",
        snapshot.mem_total_mb,
        snapshot.mem_free_mb,
        snapshot.cpu_usage,
        snapshot.running_processes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_all_labeled_lines() {
        let snapshot = MetricsSnapshot {
            mem_total_mb: 15_876,
            mem_free_mb: 4_212,
            cpu_usage: 23,
            running_processes: 5,
        };
        assert_eq!(
            render(&snapshot),
            "System information:\n\
             Total memory: 15876 MB\n\
             Free memory: 4212 MB\n\
             CPU usage: 23%\n\
             Running processes: 5\n"
        );
    }

    #[test]
    fn renders_the_default_snapshot_before_any_cycle() {
        assert_eq!(
            render(&MetricsSnapshot::default()),
            "System information:\n\
             Total memory: 0 MB\n\
             Free memory: 0 MB\n\
             CPU usage: 0%\n\
             Running processes: 0\n"
        );
    }
}
