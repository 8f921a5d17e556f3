use crate::cli::ServeArgs;
use crate::infra::{
    build_submission_target, build_verifier, AppState, InMemorySessionRepository,
};
use crate::routes::with_survey_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use esg_maturity::config::AppConfig;
use esg_maturity::error::AppError;
use esg_maturity::survey::SurveyService;
use esg_maturity::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemorySessionRepository::with_archive_capacity(
        config.storage.archive_capacity,
    ));
    let submissions = Arc::new(build_submission_target(&config.storage));
    let verifier = build_verifier(&config.email);
    let survey_service = Arc::new(SurveyService::new(repository, submissions, verifier));

    let app = with_survey_routes(survey_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "esg maturity survey service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
