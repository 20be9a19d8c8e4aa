use doctor_ranker::config::RankingConfig;
use doctor_ranker::storage::{InMemoryDoctorRepository, InMemoryWeightStore};
use doctor_ranker::workflows::ranking::RankingService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type MemoryRankingService = RankingService<InMemoryDoctorRepository, InMemoryWeightStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Ranking service over empty in-memory stores; scoring falls back to the
/// system default weights until a configuration is activated.
pub(crate) fn in_memory_service(config: &RankingConfig) -> Arc<MemoryRankingService> {
    Arc::new(RankingService::new(
        Arc::new(InMemoryDoctorRepository::default()),
        Arc::new(InMemoryWeightStore::default()),
        config,
    ))
}
