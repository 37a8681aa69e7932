use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{ComparisonError, Result};

/// Sets up the logging subscriber for the application.
///
/// `RUST_LOG` overrides the default `<target>=info` filter. Set
/// `LOG_FORMAT=json` for one JSON object per line.
pub fn init_logger(target: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", target, Level::INFO)));
    let json = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_level(true)
                    .compact(),
            )
            .try_init()
    };

    result.map_err(|e| ComparisonError::Internal(format!("Failed to initialize logger: {}", e)))
}
