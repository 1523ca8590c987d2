use crate::cli::ServeArgs;
use crate::demo::sample_dossiers;
use crate::infra::{AppState, InMemoryCandidateSource, InMemoryTrustRepository};
use crate::routes::with_screening_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use crew_screening::config::AppConfig;
use crew_screening::error::AppError;
use crew_screening::screening::{CandidateId, ScreeningJob, ScreeningJobQueue, ScreeningService};
use crew_screening::telemetry;
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

    let dossiers = sample_dossiers();
    let seeded: Vec<CandidateId> = dossiers
        .iter()
        .map(|dossier| dossier.candidate_id.clone())
        .collect();
    let source = Arc::new(InMemoryCandidateSource::seeded(dossiers));
    let repository = Arc::new(InMemoryTrustRepository::default());
    let screening_service = Arc::new(ScreeningService::new(
        source,
        repository,
        config.screening.clone(),
    ));

    warm_seeded_profiles(&screening_service, seeded).await;

    let app = with_screening_routes(screening_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        competency_enabled = config.screening.competency_enabled,
        predictive_enabled = config.screening.predictive_enabled,
        "crew screening service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Queue a full recompute for every seeded candidate so trust profiles exist before traffic.
async fn warm_seeded_profiles(
    service: &Arc<ScreeningService<InMemoryCandidateSource, InMemoryTrustRepository>>,
    candidates: Vec<CandidateId>,
) {
    let (queue, worker) = ScreeningJobQueue::spawn(Arc::clone(service), None, 64);
    for candidate in &candidates {
        for job in ScreeningJob::full_run(candidate) {
            if let Err(err) = queue.enqueue(job).await {
                warn!(candidate_id = %candidate, error = %err, "unable to queue warm-up job");
            }
        }
    }
    drop(queue);

    tokio::spawn(async move {
        match worker.await {
            Ok(report) => info!(
                candidates = candidates.len(),
                computed = report.computed,
                failed = report.failed,
                "seeded trust profiles warmed"
            ),
            Err(err) => warn!(error = %err, "warm-up worker stopped"),
        }
    });
}
