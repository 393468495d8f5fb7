//! Search run metrics.
//!
//! Small observation structs for profiling and debugging a search:
//!
//! - [`GlrParser::search`] for normal lazy operation.
//! - [`GlrParser::search_report`] for an eager run bundled with timings.
//!
//! Metrics are intentionally simple and opt-in; the lazy iterator does not
//! pay for per-offset timing unless the caller asked for a report.
//!
//! [`GlrParser::search`]: crate::GlrParser::search
//! [`GlrParser::search_report`]: crate::GlrParser::search_report

use crate::{Match, SearchIncomplete};
use std::time::Duration;

/// Timings and counters for one whole search.
#[derive(Debug, Default, Clone)]
pub struct SearchMetrics {
    /// Total elapsed time across all offsets.
    pub total: Duration,
    /// Per-offset details, in offset order.
    pub offsets: Vec<OffsetMetrics>,
    /// Matches suppressed as exact duplicates of an earlier offset's result.
    pub deduped: usize,
}

/// One engine run from a single start offset.
#[derive(Debug, Default, Clone)]
pub struct OffsetMetrics {
    /// Token index the run started from.
    pub start: usize,
    /// Elapsed time for the run.
    pub duration: Duration,
    /// Node-action applications consumed (compared against the step budget).
    pub steps: usize,
    /// Largest number of simultaneously live stack heads.
    pub peak_heads: usize,
    /// Matches the run produced before deduplication.
    pub produced: usize,
}

/// Eager search output bundled with timing information.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Deduplicated matches, in discovery order.
    pub matches: Vec<Match>,
    /// Offsets whose step budget ran out before completion.
    pub incomplete: Vec<SearchIncomplete>,
    /// Timing measurements for the run.
    pub metrics: SearchMetrics,
}
