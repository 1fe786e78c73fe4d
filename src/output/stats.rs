//! Per-search crawl statistics
//!
//! This module provides the counters a single search accumulates and a
//! formatted printout of them.

use crate::crawler::ExtractionGap;
use crate::FetchError;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// URLs committed to the visited set and fired
    pub pages_dispatched: u64,

    /// Fetches that returned a 2xx page
    pub pages_fetched: u64,

    /// Failed fetches by class
    pub timeouts: u64,
    pub network_failures: u64,
    pub http_failures: u64,

    /// HTTP failures keyed by status code
    pub failures_by_status: BTreeMap<u16, u64>,

    /// Extraction gaps keyed by description
    pub gaps: BTreeMap<String, u64>,

    /// Complex cards extracted from listing or generic pages
    pub cards_seen: u64,

    /// Same-origin links extracted (before frontier deduplication)
    pub links_discovered: u64,

    /// Records whose detail page was fetched and applied
    pub details_enriched: u64,

    /// Wall-clock duration of the search
    pub elapsed: Duration,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one classified fetch failure
    pub fn record_failure(&mut self, error: &FetchError) {
        match error {
            FetchError::Timeout => self.timeouts += 1,
            FetchError::Network(_) => self.network_failures += 1,
            FetchError::HttpStatus(status) => {
                self.http_failures += 1;
                *self.failures_by_status.entry(*status).or_insert(0) += 1;
            }
        }
    }

    /// Counts extraction gaps reported for one page
    pub fn record_gaps(&mut self, gaps: &[ExtractionGap]) {
        for gap in gaps {
            *self.gaps.entry(gap.to_string()).or_insert(0) += 1;
        }
    }

    pub fn total_failures(&self) -> u64 {
        self.timeouts + self.network_failures + self.http_failures
    }

    pub fn total_gaps(&self) -> u64 {
        self.gaps.values().sum()
    }

    /// Returns the fetch success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.pages_dispatched == 0 {
            return 0.0;
        }
        (self.pages_fetched as f64 / self.pages_dispatched as f64) * 100.0
    }
}

/// Writes statistics in a formatted manner
///
/// # Arguments
///
/// * `out` - Destination writer (the binary passes stderr)
/// * `stats` - The statistics to display
pub fn write_statistics<W: Write>(out: &mut W, stats: &CrawlStats) -> io::Result<()> {
    writeln!(out, "=== Crawl Statistics ===")?;
    writeln!(out, "  Pages dispatched: {}", stats.pages_dispatched)?;
    writeln!(
        out,
        "  Pages fetched: {} ({:.1}%)",
        stats.pages_fetched,
        stats.success_rate()
    )?;
    writeln!(out, "  Cards seen: {}", stats.cards_seen)?;
    writeln!(out, "  Links discovered: {}", stats.links_discovered)?;
    writeln!(out, "  Details enriched: {}", stats.details_enriched)?;
    writeln!(out, "  Elapsed: {:.2}s", stats.elapsed.as_secs_f64())?;

    if stats.total_failures() > 0 {
        writeln!(out, "Failures:")?;
        writeln!(out, "  Timeouts: {}", stats.timeouts)?;
        writeln!(out, "  Network: {}", stats.network_failures)?;
        writeln!(out, "  HTTP: {}", stats.http_failures)?;
        for (status, count) in &stats.failures_by_status {
            writeln!(out, "    {}: {}", status, count)?;
        }
    }

    if !stats.gaps.is_empty() {
        writeln!(out, "Extraction gaps:")?;
        for (gap, count) in &stats.gaps {
            writeln!(out, "  {}: {}", gap, count)?;
        }
    }

    Ok(())
}
