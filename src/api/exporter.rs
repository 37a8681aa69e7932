use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    comparison::Calculator,
    config::Settings,
    exposition::PublishedResults,
    metrics,
    models::ReplaceResponse,
    query::PrometheusClient,
    scheduler::Scheduler,
    store::ConfigStore,
    ComparisonError, Result,
};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Clone)]
pub struct ExporterState {
    pub store: Arc<ConfigStore>,
    pub published: Arc<PublishedResults>,
}

pub fn exporter_router(state: ExporterState) -> Router {
    Router::new()
        .route("/receive", post(receive_config))
        .route("/metrics", get(comparison_metrics))
        .route("/internal/metrics", get(self_metrics))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST /receive: replaces the whole comparison list.
async fn receive_config(
    State(state): State<ExporterState>,
    body: Bytes,
) -> Result<Json<ReplaceResponse>> {
    info!(bytes = body.len(), "receiving comparison config");
    let count = state.store.replace_all(&body).await.map_err(|e| {
        error!(error = %e, "comparison config rejected");
        e
    })?;
    info!(count, "comparison config accepted");
    Ok(Json(ReplaceResponse::ok()))
}

/// GET /metrics: the published comparison results.
async fn comparison_metrics(State(state): State<ExporterState>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, TEXT_PLAIN)], state.published.render())
}

/// GET /internal/metrics: the exporter's own counters.
async fn self_metrics() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, TEXT_PLAIN)], metrics::gather_text())
}

async fn healthz() -> &'static str {
    "ok"
}

/// Loads the config, starts the scheduler and serves until Ctrl-C.
pub async fn start_exporter(settings: Settings) -> Result<()> {
    let store = Arc::new(ConfigStore::load(&settings.config_path).await);
    let published = Arc::new(PublishedResults::new());
    let client = PrometheusClient::new(&settings.prometheus_url, settings.query_timeout)?;

    let scheduler = Arc::new(Scheduler::new(
        store.clone(),
        published.clone(),
        Calculator::new(Arc::new(client)),
        settings.calc_interval,
    ));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let scheduler_task = tokio::spawn(scheduler.run(async move {
        let _ = stop_rx.await;
    }));

    let app = exporter_router(ExporterState { store, published });
    let addr = settings.listen_addr();
    info!(%addr, backend = %settings.prometheus_url, "starting metric comparison exporter");

    let listener = TcpListener::bind(&addr).await.map_err(|e|
        ComparisonError::Internal(format!("Failed to bind to address: {}", e)))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .map_err(|e| ComparisonError::Internal(format!("Server error: {}", e)));

    let _ = stop_tx.send(());
    let _ = scheduler_task.await;
    served
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::models::ComparisonResult;

    async fn test_state(dir: &TempDir) -> ExporterState {
        ExporterState {
            store: Arc::new(ConfigStore::load(dir.path().join("cache.json")).await),
            published: Arc::new(PublishedResults::new()),
        }
    }

    async fn body_json(resp: axum::response::Response) -> ReplaceResponse {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn receive_valid_config() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;
        let body = Bytes::from_static(
            br#"[{"PromExpr":"a","OriginPromExpr":"b","ComparisonType":"day","CalcPeriod":60,"CalcMethod":"avg","CalcType":"diff"}]"#,
        );

        let resp = receive_config(State(state.clone()), body).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, ReplaceResponse::ok());
        assert_eq!(state.store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn receive_malformed_config_reports_error_with_ok_status() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;

        let resp = receive_config(State(state.clone()), Bytes::from_static(b"{oops"))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body.status, "ERROR");
        assert!(!body.message.is_empty());
        assert!(state.store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_text() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;
        state.published.replace(vec![ComparisonResult {
            name: "cpu_diff".to_string(),
            labels: vec![
                ("host".to_string(), "h1".to_string()),
                ("calc_type".to_string(), "diff".to_string()),
            ],
            value: 12.345,
        }]);

        let resp = comparison_metrics(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("text/plain"));
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"cpu_diff{host=\"h1\",calc_type=\"diff\"} 12.35\n");
    }
}
