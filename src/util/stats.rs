//! Run statistics and their output
// (c) 2026 Ferry contributors

use std::{fmt::Display, time::Duration};

use human_repr::{HumanCount as _, HumanDuration as _, HumanThroughput as _};
use tracing::{info, warn};

/// Human friendly output helper
#[derive(Debug, Clone, Copy)]
pub(crate) struct DataRate {
    /// Bytes per second; if None, we were unable to compute a rate.
    rate: Option<f64>,
}

impl DataRate {
    /// Standard constructor
    #[must_use]
    pub(crate) fn new(bytes: u64, time: Duration) -> Self {
        if time.is_zero() {
            return Self { rate: None };
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = Some((bytes as f64) / time.as_secs_f64());
        Self { rate }
    }
}

impl Display for DataRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.rate {
            None => f.write_str("unknown"),
            Some(rate) => rate.human_throughput_bytes().fmt(f),
        }
    }
}

/// What happened during a client run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Files which arrived complete
    pub downloaded: usize,
    /// Files which were attempted but did not arrive
    pub failed: usize,
    /// Manifest entries rejected before any network activity
    pub rejected: usize,
    /// Files never attempted because the run was stopped early
    pub skipped: usize,
    /// Payload bytes received for completed files
    pub bytes: u64,
    /// Wall time spent transferring
    pub elapsed: Duration,
}

impl RunStats {
    /// Did everything asked for arrive?
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.rejected == 0 && self.skipped == 0
    }

    /// Number of manifest entries considered
    #[must_use]
    pub fn requested(&self) -> usize {
        self.downloaded + self.failed + self.rejected + self.skipped
    }
}

/// Outputs the end-of-run summary
pub(crate) fn report(stats: &RunStats) {
    if stats.downloaded > 0 {
        info!(
            "Downloaded {} of {} file(s): {} in {}; average {}",
            stats.downloaded,
            stats.requested(),
            stats.bytes.human_count_bytes(),
            stats.elapsed.human_duration(),
            DataRate::new(stats.bytes, stats.elapsed),
        );
    } else {
        info!("No files downloaded");
    }
    if stats.failed > 0 {
        warn!("{} file(s) failed to download", stats.failed);
    }
    if stats.rejected > 0 {
        warn!("{} manifest entr(ies) rejected", stats.rejected);
    }
    if stats.skipped > 0 {
        warn!("{} file(s) not attempted", stats.skipped);
    }
}
