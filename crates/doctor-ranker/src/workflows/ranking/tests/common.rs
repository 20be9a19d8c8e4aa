use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::config::RankingConfig;
use crate::storage::{InMemoryDoctorRepository, InMemoryWeightStore};
use crate::workflows::ranking::{ranking_router, RankingService};
use crate::workflows::roster::{
    DoctorId, DoctorProfile, DoctorRecord, DoctorRepository, MetricSet, QualityScores,
    RepositoryError,
};
use crate::workflows::weights::{StandardWeights, WeightConfigDraft, WeightConfiguration};

pub(super) type MemoryService = RankingService<InMemoryDoctorRepository, InMemoryWeightStore>;

pub(super) const IMPORT_PAYLOAD: &str = "姓名,职称,医院,科室,总粉丝,总获赞,总作品,表现力评分,回复率\n\
    王芳,主任医师,协和医院,心血管内科,\"820,000\",\"2,400,000\",160,92,88%\n\
    ,主治医师,同仁医院,神经内科,120000,300000,90,80,70\n\
    赵磊,住院医师,县医院,外科,9000,12000,30,65,150\n";

pub(super) fn ranking_config() -> RankingConfig {
    RankingConfig::default()
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryDoctorRepository>,
    Arc<InMemoryWeightStore>,
) {
    let doctors = Arc::new(InMemoryDoctorRepository::default());
    let weights = Arc::new(InMemoryWeightStore::default());
    let service = RankingService::new(doctors.clone(), weights.clone(), &ranking_config());
    (service, doctors, weights)
}

pub(super) fn seeded_service() -> MemoryService {
    let (service, doctors, _) = build_service();
    for record in roster() {
        doctors.upsert(record).expect("seed doctor");
    }
    service
}

pub(super) fn doctor(id: &str, title: &str, followers: u64, rating: f64) -> DoctorRecord {
    DoctorRecord {
        id: DoctorId::from(id),
        profile: DoctorProfile {
            name: format!("Doctor {id}"),
            title: title.to_string(),
            affiliation: "Union Hospital".to_string(),
            department: "Cardiology".to_string(),
            region: Some("Beijing".to_string()),
            agency: None,
        },
        metrics: MetricSet {
            total_followers: followers,
            total_likes: followers * 3,
            total_works: 120,
            quality: QualityScores {
                performance: Some(rating),
                affinity: Some(rating),
                editing: Some(rating),
                video_quality: Some(rating),
            },
            ..MetricSet::default()
        },
    }
}

pub(super) fn roster() -> Vec<DoctorRecord> {
    vec![
        doctor("d-1", "主任医师", 1_500_000, 95.0),
        doctor("d-2", "副主任医师", 300_000, 70.0),
        doctor("d-3", "住院医师", 20_000, 40.0),
    ]
}

pub(super) fn reach_draft(name: &str, is_default: bool) -> WeightConfigDraft {
    WeightConfigDraft {
        name: name.to_string(),
        description: Some("reach heavy".to_string()),
        weights: WeightConfiguration::Standard(StandardWeights {
            influence_weight: 0.6,
            activity_weight: 0.1,
            quality_weight: 0.3,
            price_weight: None,
            title_weight: None,
        }),
        is_default,
    }
}

pub(super) fn quality_draft(name: &str) -> WeightConfigDraft {
    WeightConfigDraft {
        name: name.to_string(),
        description: None,
        weights: WeightConfiguration::Standard(StandardWeights {
            influence_weight: 0.1,
            activity_weight: 0.1,
            quality_weight: 0.8,
            price_weight: None,
            title_weight: Some(1.0),
        }),
        is_default: false,
    }
}

pub(super) struct UnavailableRepository;

impl DoctorRepository for UnavailableRepository {
    fn fetch(&self, _id: &DoctorId) -> Result<Option<DoctorRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<DoctorRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn upsert(&self, _record: DoctorRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _record: DoctorRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn replace_metrics(
        &self,
        _id: &DoctorId,
        _metrics: MetricSet,
    ) -> Result<DoctorRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    ranking_router(Arc::new(service))
}
