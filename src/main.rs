use metric_comparison_exporter::{api::exporter, config::Settings, logging};

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init_logger("metric_comparison_exporter") {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let settings = Settings::from_env();

    if let Err(e) = exporter::start_exporter(settings).await {
        tracing::error!(error = %e, "exporter exited");
        std::process::exit(1);
    }
}
