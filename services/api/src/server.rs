use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::dss_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use health_dss::config::AppConfig;
use health_dss::dss::DssRegistry;
use health_dss::error::AppError;
use health_dss::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let registry = Arc::new(DssRegistry::load(&config.dss)?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        registry,
    };

    let app = dss_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        policy = ?config.dss.failure_policy,
        concurrency = config.dss.population_concurrency,
        "decision support service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
