use serde::{Deserialize, Serialize};

use crate::{ComparisonError, Result};

/// How far back the historical window is shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonType {
    Day,
    Week,
    Month,
}

/// Reduction applied to each window's samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalcMethod {
    Avg,
    Sum,
    Max,
    Min,
}

/// One kind of published output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcKind {
    Diff,
    DiffPercent,
}

impl CalcKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalcKind::Diff => "diff",
            CalcKind::DiffPercent => "diff_percent",
        }
    }
}

/// A configured period-over-period comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComparisonConfig {
    /// Output metric name.
    pub prom_expr: String,
    /// Source query expression, possibly containing `$variable` placeholders.
    pub origin_prom_expr: String,
    pub comparison_type: ComparisonType,
    /// Window length in seconds.
    pub calc_period: u64,
    pub calc_method: CalcMethod,
    /// Comma separated subset of `diff`, `diff_percent`.
    pub calc_type: String,
}

/// Parses a configuration document and rejects periods no window can span.
pub fn parse_configs(raw: &[u8]) -> Result<Vec<ComparisonConfig>> {
    let configs: Vec<ComparisonConfig> = serde_json::from_slice(raw)?;
    if let Some(bad) = configs.iter().find(|c| i64::try_from(c.calc_period).is_err()) {
        return Err(ComparisonError::Config(format!(
            "{}: CalcPeriod {} is out of range",
            bad.prom_expr, bad.calc_period
        )));
    }
    Ok(configs)
}

impl ComparisonConfig {
    /// Requested output kinds, always in `diff`, `diff_percent` order.
    /// Unknown entries are ignored.
    pub fn calc_kinds(&self) -> Vec<CalcKind> {
        let requested: Vec<&str> = self.calc_type.split(',').map(str::trim).collect();
        [CalcKind::Diff, CalcKind::DiffPercent]
            .into_iter()
            .filter(|kind| requested.contains(&kind.as_str()))
            .collect()
    }
}

/// One published comparison fact.
///
/// Labels keep insertion order: the series tags sorted by key, then `calc_type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub name: String,
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl ComparisonResult {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Body returned by the configuration replace endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplaceResponse {
    pub status: String,
    pub message: String,
}

impl ReplaceResponse {
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
            message: "success".to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "ERROR".to_string(),
            message: message.into(),
        }
    }
}
