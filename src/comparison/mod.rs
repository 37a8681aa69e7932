//! Period-over-period comparison of one configured expression.

pub mod reduce;
pub mod signature;

use std::sync::Arc;

use chrono::{DateTime, Months, TimeZone};
use tracing::debug;

use crate::models::{CalcKind, ComparisonConfig, ComparisonResult, ComparisonType};
use crate::query::{rewrite, QueryWindow, SeriesResult, SeriesSource};
use crate::{ComparisonError, Result};

const DAY_SECS: i64 = 86_400;

/// The two windows compared for one config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonWindows {
    pub current: QueryWindow,
    pub history: QueryWindow,
}

/// End of the historical window for a comparison made at `now`.
///
/// Months are calendar months; a day that does not exist in the previous
/// month is clamped to its last day.
pub fn history_end<Tz: TimeZone>(kind: ComparisonType, now: &DateTime<Tz>) -> Result<i64> {
    match kind {
        ComparisonType::Day => Ok(now.timestamp() - DAY_SECS),
        ComparisonType::Week => Ok(now.timestamp() - DAY_SECS * 7),
        ComparisonType::Month => now
            .clone()
            .checked_sub_months(Months::new(1))
            .map(|then| then.timestamp())
            .ok_or_else(|| ComparisonError::Internal(format!("Cannot shift {} back one month", now.naive_utc()))),
    }
}

/// Builds the current and historical windows for `config` at `now`.
pub fn windows_for<Tz: TimeZone>(config: &ComparisonConfig, now: &DateTime<Tz>) -> Result<ComparisonWindows> {
    let expr = rewrite(&config.origin_prom_expr);
    let history_end = history_end(config.comparison_type, now)?;
    Ok(ComparisonWindows {
        current: QueryWindow::ending_at(now.timestamp(), config.calc_period, expr.clone())?,
        history: QueryWindow::ending_at(history_end, config.calc_period, expr)?,
    })
}

/// Joins current series to historical ones and emits the requested deltas.
///
/// Each current series is paired with the first historical series carrying
/// the same tags; later duplicates are ignored. Unpaired series, and pairs
/// where either window is empty, produce nothing.
pub fn compare(
    config: &ComparisonConfig,
    current: &[SeriesResult],
    history: &[SeriesResult],
) -> Vec<ComparisonResult> {
    let kinds = config.calc_kinds();
    let mut results = Vec::new();

    for series in current {
        let Some(previous) = history.iter().find(|h| series.tags.matches(&h.tags)) else {
            continue;
        };
        let (Some(cur_val), Some(hist_val)) = (
            config.calc_method.reduce(&series.samples),
            config.calc_method.reduce(&previous.samples),
        ) else {
            continue;
        };

        for kind in &kinds {
            let value = match kind {
                CalcKind::Diff => cur_val - hist_val,
                // A zero baseline yields a non-finite value, published as is.
                CalcKind::DiffPercent => (cur_val - hist_val) * 100.0 / hist_val,
            };
            let mut labels: Vec<(String, String)> = series.tags.iter().cloned().collect();
            labels.push(("calc_type".to_string(), kind.as_str().to_string()));
            results.push(ComparisonResult {
                name: config.prom_expr.clone(),
                labels,
                value,
            });
        }
    }

    results
}

/// Runs comparisons against a series source.
#[derive(Clone)]
pub struct Calculator {
    source: Arc<dyn SeriesSource>,
}

impl Calculator {
    pub fn new(source: Arc<dyn SeriesSource>) -> Self {
        Self { source }
    }

    /// Queries both windows and computes the results for one config.
    ///
    /// Any query failure, or an empty answer for either window, fails the
    /// whole config.
    pub async fn run(&self, config: &ComparisonConfig, windows: &ComparisonWindows) -> Result<Vec<ComparisonResult>> {
        let current = self.source.query(&windows.current).await?;
        let history = self.source.query(&windows.history).await?;

        if current.is_empty() || history.is_empty() {
            return Err(ComparisonError::NoData(format!(
                "{}: current={} history={} series",
                config.prom_expr,
                current.len(),
                history.len()
            )));
        }

        let results = compare(config, &current, &history);
        debug!(
            name = %config.prom_expr,
            current = current.len(),
            history = history.len(),
            emitted = results.len(),
            "comparison computed"
        );
        Ok(results)
    }
}
