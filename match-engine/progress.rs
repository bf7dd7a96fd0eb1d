use match_core::PairKey;

/// Observer of matching progress. Called while the result table is locked, so keep it cheap.
pub trait Progress: Sync {
    fn begin(&self, _total: usize) {}

    /// One (i, j) unit finished; `done` counts finished units including this one.
    fn pair_completed(&self, pair: PairKey, done: usize, total: usize);
}

/// Ignores all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn pair_completed(&self, _pair: PairKey, _done: usize, _total: usize) {}
}

/// Logs at `info` level every time another tenth of the pairs completes
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn begin(&self, total: usize) {
        log::info!("matching {} image pairs", total);
    }

    fn pair_completed(&self, pair: PairKey, done: usize, total: usize) {
        log::trace!("pair {} done", pair);
        if total == 0 {
            return;
        }
        if done == total || done * 10 / total != (done - 1) * 10 / total {
            log::info!("{}/{} pairs matched ({}%)", done, total, done * 100 / total);
        }
    }
}
