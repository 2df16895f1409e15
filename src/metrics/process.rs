//! Census of running processes from the /proc table.

use tracing::warn;

/// Count processes currently in the running/runnable scheduling state.
///
/// The process table mutates underneath the traversal, so entries are read
/// one at a time: a process that exits mid-scan fails its own read and is
/// skipped, and nothing else on the system is paused. The result is a
/// near-consistent approximation of one instant, not a serializable
/// snapshot.
///
/// Never signals an error: an unreadable table logs a warning and yields 0.
pub fn running_count() -> usize {
    let all = match procfs::process::all_processes() {
        Ok(iter) => iter,
        Err(err) => {
            warn!("failed to enumerate /proc: {err}");
            return 0;
        }
    };

    all.filter_map(Result::ok)
        .filter(|proc| matches!(proc.stat(), Ok(stat) if stat.state == 'R'))
        .count()
}
