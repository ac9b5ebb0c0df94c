//! Capture session worker binary.

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use posecap_core::CaptureConfig;
use posecap_worker::{run_capture, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Ok(directive) = "posecap_core=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
            None
        }
    };

    info!("Starting posecap-worker");

    // Load configuration
    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let capture = match CaptureConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid capture configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Capture config: {:?}", capture);

    let report = match run_capture(&config, capture).await {
        Ok(r) => r,
        Err(e) => {
            error!("Capture failed: {:#}", e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize capture report: {}", e),
    }

    if let Some(handle) = metrics {
        let snapshot = handle.render();
        if config.print_metrics {
            println!("{}", snapshot);
        } else {
            debug!("Metrics snapshot:\n{}", snapshot);
        }
    }

    if report.completed {
        info!("Worker shutdown complete");
    } else {
        warn!("Capture did not complete");
        std::process::exit(2);
    }
}
