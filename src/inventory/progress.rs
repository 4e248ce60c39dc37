//! Progress reporting hooks
//!
//! Observers see the run advance; they never influence it.

/// Receives progress notifications from the orchestrator
pub trait ProgressObserver: Send + Sync {
    fn accounts_resolved(&self, _allowed: usize, _excluded: usize) {}

    fn units_planned(&self, _total: usize) {}

    fn unit_finished(&self, completed: usize, total: usize);

    fn finished(&self) {}
}

/// Reports progress through the log
///
/// Every unit is logged at debug; info gets a line each time another tenth
/// of the sweep completes.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn accounts_resolved(&self, allowed: usize, excluded: usize) {
        log::info!(
            "Scanning {} accounts ({} excluded by configuration)",
            allowed,
            excluded
        );
    }

    fn units_planned(&self, total: usize) {
        log::info!("Planned {} work units", total);
    }

    fn unit_finished(&self, completed: usize, total: usize) {
        log::debug!("Progress: {}/{}", completed, total);
        if total > 0 && crosses_tenth(completed, total) {
            log::info!(
                "Progress: {}/{} work units ({}%)",
                completed,
                total,
                completed * 100 / total
            );
        }
    }
}

// true when `completed` is the first unit to reach a new 10% band
fn crosses_tenth(completed: usize, total: usize) -> bool {
    let band = |n: usize| n * 10 / total;
    completed > 0 && band(completed) != band(completed - 1)
}

/// Observer that ignores everything
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn unit_finished(&self, _completed: usize, _total: usize) {}
}
