use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{QueryWindow, Sample, SeriesResult, SeriesSource};
use crate::comparison::signature::TagSet;
use crate::metrics::QueryTimer;
use crate::{ComparisonError, Result};

const QUERY_RANGE_PATH: &str = "/api/v1/query_range";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<RawSeries>,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    #[serde(default)]
    values: Vec<(f64, String)>,
}

impl From<RawSeries> for SeriesResult {
    fn from(raw: RawSeries) -> Self {
        let samples = raw
            .values
            .into_iter()
            // Unparseable sample values count as zero.
            .map(|(ts, v)| Sample::new(ts, v.parse().unwrap_or(0.0)))
            .collect();
        SeriesResult {
            tags: TagSet::from(raw.metric),
            samples,
        }
    }
}

/// HTTP client for the Prometheus range-query API.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl PrometheusClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join(QUERY_RANGE_PATH))
            .map_err(|e| ComparisonError::Internal(format!("Invalid backend url {}: {}", base_url, e)))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ComparisonError::Internal(format!("Failed to build http client: {}", e)))?;
        Ok(Self { http, endpoint })
    }

    fn request_url(&self, window: &QueryWindow) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("start", &window.start.to_string())
            .append_pair("end", &window.end.to_string())
            .append_pair("step", &window.step.to_string())
            .append_pair("query", &window.expr);
        url
    }
}

#[async_trait]
impl SeriesSource for PrometheusClient {
    async fn query(&self, window: &QueryWindow) -> Result<Vec<SeriesResult>> {
        let url = self.request_url(window);
        let _timer = QueryTimer::new();
        debug!(%url, "querying backend");

        let response = self.http.get(url.clone()).send().await.map_err(|e| {
            warn!(%url, error = %e, "backend request failed");
            ComparisonError::from(e)
        })?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(%url, %body, status = status.as_u16(), "backend returned error status");
            return Err(ComparisonError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        parse_body(url.as_str(), &body)
    }
}

/// Decodes a range-query response envelope.
pub(crate) fn parse_body(url: &str, body: &str) -> Result<Vec<SeriesResult>> {
    let parsed: QueryResponse = serde_json::from_str(body).map_err(|e| {
        warn!(%url, %body, "undecodable backend response");
        ComparisonError::Decode(e.to_string())
    })?;

    if parsed.status != "success" {
        warn!(%url, %body, status = %parsed.status, "backend reported failure");
        return Err(ComparisonError::BackendStatus {
            status: parsed.status,
            url: url.to_string(),
            body: body.to_string(),
        });
    }

    Ok(parsed
        .data
        .map(|data| data.result.into_iter().map(SeriesResult::from).collect())
        .unwrap_or_default())
}
