//! Range queries against the time-series backend.

pub mod client;
pub mod rewrite;

use async_trait::async_trait;

use crate::comparison::signature::TagSet;
use crate::{ComparisonError, Result};

pub use client::PrometheusClient;
pub use rewrite::rewrite;

/// Resolution of every range query, in seconds.
pub const QUERY_STEP_SECS: i64 = 10;

/// A time range plus the expression to evaluate over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: i64,
    pub end: i64,
    pub step: i64,
    pub expr: String,
}

impl QueryWindow {
    /// The window `[end - period, end]`. Fails if the start is not representable.
    pub fn ending_at(end: i64, period_secs: u64, expr: impl Into<String>) -> Result<Self> {
        let start = i64::try_from(period_secs)
            .ok()
            .and_then(|period| end.checked_sub(period))
            .ok_or_else(|| ComparisonError::Config(format!("window of {}s before {} is out of range", period_secs, end)))?;
        Ok(Self {
            start,
            end,
            step: QUERY_STEP_SECS,
            expr: expr.into(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: f64,
    pub value: f64,
}

impl Sample {
    pub const fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// One series returned by a range query.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesResult {
    pub tags: TagSet,
    pub samples: Vec<Sample>,
}

/// Anything that can answer a range query.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    async fn query(&self, window: &QueryWindow) -> Result<Vec<SeriesResult>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_spans_period_before_end() {
        let w = QueryWindow::ending_at(1_000, 300, "up").unwrap();
        assert_eq!(w.start, 700);
        assert_eq!(w.end, 1_000);
        assert_eq!(w.step, 10);
    }

    #[test]
    fn oversized_period_is_an_error() {
        assert!(QueryWindow::ending_at(1_000, u64::MAX, "up").is_err());
        assert!(QueryWindow::ending_at(-10, i64::MAX as u64, "up").is_err());
    }
}
