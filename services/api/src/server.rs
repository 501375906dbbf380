use crate::cli::ServeArgs;
use crate::infra::{AppState, Services};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ev_grid::config::AppConfig;
use ev_grid::error::AppError;
use ev_grid::telemetry;
use std::sync::atomic::Ordering;
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
    if let Some(seed_dir) = args.seed_dir.take() {
        config.catalog.seed_dir = Some(seed_dir);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = Services::in_memory(config.matching);
    services.seed(config.catalog.seed_dir.as_deref())?;

    let app = with_service_routes(services.catalog_service, services.applications)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        default_radius_km = config.matching.default_radius_km,
        unmatched = ?config.matching.unmatched,
        "ev grid service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
