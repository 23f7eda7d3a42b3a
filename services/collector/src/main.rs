use collector::{CollectorConfig, CollectorRuntime, TransportRuntime, transport};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match CollectorConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "collector configuration invalid");
            std::process::exit(1);
        }
    };

    let runtime = match CollectorRuntime::from_config(&config) {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, db_path = ?config.db_path, "opening fingerprint store failed");
            std::process::exit(1);
        }
    };

    tracing::info!(
        bind_addr = %config.bind_addr,
        http_workers = config.http_workers,
        http_queue_capacity = config.http_queue_capacity,
        transport_runtime = config.transport_runtime.as_str(),
        persistent = config.db_path.is_some(),
        "collector starting"
    );

    match config.transport_runtime {
        TransportRuntime::Std => {
            if let Err(err) = transport::serve_http_with_workers(
                runtime,
                &config.bind_addr,
                config.http_workers,
                config.http_queue_capacity,
            ) {
                tracing::error!(error = %err, "collector transport failed");
                std::process::exit(1);
            }
        }
        TransportRuntime::Axum => {
            #[cfg(feature = "async-transport")]
            {
                if let Err(err) = collector::transport_axum::serve_http_with_axum(
                    runtime,
                    &config.bind_addr,
                    config.http_workers,
                ) {
                    tracing::error!(error = %err, "collector transport failed");
                    std::process::exit(1);
                }
            }
            #[cfg(not(feature = "async-transport"))]
            {
                drop(runtime);
                tracing::error!(
                    "collector transport runtime 'axum' requires build feature 'async-transport'"
                );
                std::process::exit(1);
            }
        }
    }
}
