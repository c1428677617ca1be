use crate::cli::ServeArgs;
use crate::infra::{adapter_registry, AppState, ConfiguredStore};
use crate::routes::with_proofing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use identity_proofing::config::AppConfig;
use identity_proofing::error::AppError;
use identity_proofing::proofing::{
    DelegatedExecutor, ExecutionTopology, ProofingService, QueueExecutor,
};
use identity_proofing::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let registry = adapter_registry(&config.proofing)?;
    let store = Arc::new(ConfiguredStore::from_config(&config.proofing)?);

    let (executor, queue) = match config.proofing.execution {
        ExecutionTopology::InProcess => (None, None),
        ExecutionTopology::Delegated => {
            let (executor, queue) = QueueExecutor::channel();
            let executor: Arc<dyn DelegatedExecutor> = Arc::new(executor);
            (Some(executor), Some(queue))
        }
    };

    let proofing_service = Arc::new(ProofingService::from_config(
        &config.proofing,
        registry,
        store,
        executor,
    ));

    if let Some(queue) = queue {
        match proofing_service.delegated_worker() {
            Some(worker) => {
                tokio::spawn(worker.run(queue));
            }
            None => warn!("delegated execution without a callback token; jobs will not run"),
        }
    }

    let app = with_proofing_routes(proofing_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        execution = ?config.proofing.execution,
        %addr,
        "identity proofing service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
