use crate::cli::ServeArgs;
use crate::infra::{evaluation_engine, AppState, DirectoryObjectStore, InMemoryScanRepository};
use crate::routes::with_scan_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use claim_scan::config::AppConfig;
use claim_scan::error::AppError;
use claim_scan::telemetry;
use claim_scan::workflows::scan::{ScanService, ScanSettings};
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

    telemetry::init(&config.telemetry)?;

    let engine = evaluation_engine(None, Some(&config.scan))?;
    let store = Arc::new(DirectoryObjectStore::new(config.scan.storage_root.clone()));
    let repository = Arc::new(InMemoryScanRepository::default());
    let scan_service = Arc::new(ScanService::new(
        repository,
        store.clone(),
        engine,
        ScanSettings::from(&config.scan),
    ));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        store,
    };

    let app = with_scan_routes(scan_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        storage_root = %config.scan.storage_root.display(),
        "claim packet scanner ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
