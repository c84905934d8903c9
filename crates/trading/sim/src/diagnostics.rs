//! Per-strategy observation and ring-buffer health statistics

use anyhow::{Context, Result};
use bus::ReadBatch;
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// What one strategy saw and how far behind the writer it fell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyDiagnostics {
    /// Reads that found the cursor already overwritten
    pub buffer_overflows: u64,
    /// Updates lost to overwrites, summed over all reads
    pub updates_missed: u64,
    /// Largest number of updates returned by a single read
    pub max_backlog: u64,
    /// Publish-to-observe latency of each update, in nanoseconds
    pub lags: Vec<u64>,
    /// Observed best bids, display units
    pub bids: Vec<f64>,
    /// Observed best asks, display units
    pub asks: Vec<f64>,
}

impl StrategyDiagnostics {
    /// Account for one non-empty read
    pub fn record_read<T>(&mut self, batch: &ReadBatch<T>) {
        let missed = u64::try_from(batch.missed()).unwrap_or(u64::MAX);
        if missed > 0 {
            self.buffer_overflows += 1;
            self.updates_missed += missed;
            debug!("Ring overflow, {} updates missed", missed);
        }
        let backlog = u64::try_from(batch.len()).unwrap_or(u64::MAX);
        self.max_backlog = self.max_backlog.max(backlog);
    }

    /// Record a publish-to-observe latency
    pub fn record_lag(&mut self, nanos: u64) {
        self.lags.push(nanos);
    }

    /// Record an observed top; empty sides are left out
    pub fn record_observation(&mut self, bid: f64, ask: f64) {
        if bid > 0.0 {
            self.bids.push(bid);
        }
        if ask > 0.0 {
            self.asks.push(ask);
        }
    }

    /// Human-readable summary of counters and observation ranges
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Num obs: {}, {}", self.bids.len(), self.asks.len());
        if let Some((avg, min, max)) = stats(&self.bids) {
            let _ = writeln!(out, "Avg bid: {avg:.4}");
            let _ = writeln!(out, "Min/max bid: {min:.4} {max:.4}");
        }
        if let Some((avg, min, max)) = stats(&self.asks) {
            let _ = writeln!(out, "Avg ask: {avg:.4}");
            let _ = writeln!(out, "Min/max ask: {min:.4} {max:.4}");
        }
        let _ = writeln!(out, "Buffer overflows: {}", self.buffer_overflows);
        let _ = writeln!(out, "Updates missed: {}", self.updates_missed);
        let _ = writeln!(out, "Max buffer size: {}", self.max_backlog);
        if let Some(hist) = self.lag_histogram() {
            let _ = writeln!(out, "Average lag: {:.0}ns", hist.mean());
            let _ = writeln!(out, "Min/max lag: {}ns {}ns", hist.min(), hist.max());
            let _ = writeln!(
                out,
                "Lag p50/p99/p99.9: {}ns {}ns {}ns",
                hist.value_at_quantile(0.5),
                hist.value_at_quantile(0.99),
                hist.value_at_quantile(0.999)
            );
        }
        out
    }

    /// Latency distribution, `None` before the first lag
    #[must_use]
    pub fn lag_histogram(&self) -> Option<Histogram<u64>> {
        if self.lags.is_empty() {
            return None;
        }
        let mut hist = Histogram::<u64>::new(3).ok()?;
        for lag in &self.lags {
            hist.saturating_record(*lag);
        }
        Some(hist)
    }

    /// Write as JSON, creating parent directories
    ///
    /// # Errors
    /// Fails if the directory or file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }
        let json = serde_json::to_string(self)?;
        fs::write(path, json)
            .with_context(|| format!("Could not open output file '{}'", path.display()))?;
        info!("Saved diagnostics to {}", path.display());
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn stats(values: &[f64]) -> Option<(f64, f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((sum / values.len() as f64, min, max))
}
