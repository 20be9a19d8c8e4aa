use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::service::{RankingService, RankingServiceError};
use crate::workflows::import::{template, CommitMode, ImportError};
use crate::workflows::roster::{DoctorId, DoctorRepository, MetricSet, RepositoryError};
use crate::workflows::weights::{
    analyze, presets, MedicalWeights, WeightConfigDraft, WeightConfigError, WeightConfigId,
    WeightConfigStore, WeightConfiguration,
};

/// Router builder exposing weight management, standings and import endpoints.
pub fn ranking_router<D, W>(service: Arc<RankingService<D, W>>) -> Router
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/weights",
            get(list_weights_handler::<D, W>).post(save_weights_handler::<D, W>),
        )
        .route("/api/v1/weights/active", get(active_weights_handler::<D, W>))
        .route(
            "/api/v1/weights/validate",
            post(validate_weights_handler::<D, W>),
        )
        .route("/api/v1/weights/presets", get(presets_handler))
        .route(
            "/api/v1/weights/analyze",
            post(analyze_weights_handler::<D, W>),
        )
        .route(
            "/api/v1/weights/:config_id",
            get(get_weights_handler::<D, W>)
                .put(update_weights_handler::<D, W>)
                .delete(delete_weights_handler::<D, W>),
        )
        .route(
            "/api/v1/weights/:config_id/activate",
            post(activate_handler::<D, W>),
        )
        .route("/api/v1/scores", get(standings_handler::<D, W>))
        .route(
            "/api/v1/scores/recalculate",
            post(recalculate_handler::<D, W>),
        )
        .route(
            "/api/v1/scores/recommended",
            get(recommended_handler::<D, W>),
        )
        .route("/api/v1/doctors/:doctor_id", get(doctor_handler::<D, W>))
        .route(
            "/api/v1/doctors/:doctor_id/metrics",
            put(update_metrics_handler::<D, W>),
        )
        .route("/api/v1/import", post(import_handler::<D, W>))
        .route("/api/v1/import/preview", post(preview_handler::<D, W>))
        .route("/api/v1/import/template", get(template_handler))
        .with_state(service)
}

type SharedService<D, W> = State<Arc<RankingService<D, W>>>;

/// Runs scoring or import work on the blocking pool so request workers stay free.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|error| {
        tracing::error!(error = %error, "blocking ranking task failed");
        let payload = json!({
            "error": "ranking task did not complete",
        });
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
    })
}

pub(crate) async fn list_weights_handler<D, W>(State(service): SharedService<D, W>) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    match service.weights().list() {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn save_weights_handler<D, W>(
    State(service): SharedService<D, W>,
    axum::Json(draft): axum::Json<WeightConfigDraft>,
) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    let outcome = match run_blocking(move || service.save_configuration(draft)).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn active_weights_handler<D, W>(State(service): SharedService<D, W>) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    let snapshot = service.weights().get_active();
    (StatusCode::OK, axum::Json(snapshot)).into_response()
}

pub(crate) async fn validate_weights_handler<D, W>(
    State(service): SharedService<D, W>,
    axum::Json(weights): axum::Json<WeightConfiguration>,
) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    let check = service.weights().check(&weights);
    (StatusCode::OK, axum::Json(check)).into_response()
}

pub(crate) async fn presets_handler() -> Response {
    (StatusCode::OK, axum::Json(presets())).into_response()
}

pub(crate) async fn analyze_weights_handler<D, W>(
    State(service): SharedService<D, W>,
    axum::Json(weights): axum::Json<MedicalWeights>,
) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    let impact = analyze(&weights);
    let check = service
        .weights()
        .check(&WeightConfiguration::Medical(weights));
    let payload = json!({
        "impact": impact,
        "validation": check,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn get_weights_handler<D, W>(
    State(service): SharedService<D, W>,
    Path(config_id): Path<u64>,
) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    match service.weights().fetch(WeightConfigId(config_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn update_weights_handler<D, W>(
    State(service): SharedService<D, W>,
    Path(config_id): Path<u64>,
    axum::Json(weights): axum::Json<WeightConfiguration>,
) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    let outcome = match run_blocking(move || {
        service.update_configuration(WeightConfigId(config_id), weights)
    })
    .await
    {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_weights_handler<D, W>(
    State(service): SharedService<D, W>,
    Path(config_id): Path<u64>,
) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    match service.weights().delete(WeightConfigId(config_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn activate_handler<D, W>(
    State(service): SharedService<D, W>,
    Path(config_id): Path<u64>,
) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    let outcome = match run_blocking(move || service.activate(WeightConfigId(config_id))).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok((configuration, recalculation)) => {
            let payload = json!({
                "configuration": configuration,
                "recalculation": recalculation,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn recalculate_handler<D, W>(State(service): SharedService<D, W>) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    let outcome = match run_blocking(move || service.recalculate()).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn standings_handler<D, W>(State(service): SharedService<D, W>) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    (StatusCode::OK, axum::Json(service.standings())).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecommendationQuery {
    min_score: Option<f64>,
    limit: Option<usize>,
}

pub(crate) async fn recommended_handler<D, W>(
    State(service): SharedService<D, W>,
    Query(query): Query<RecommendationQuery>,
) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    let min_score = query
        .min_score
        .unwrap_or_else(|| service.thresholds().priority());
    let entries = service.recommended(min_score, query.limit.unwrap_or(10));
    (StatusCode::OK, axum::Json(entries)).into_response()
}

pub(crate) async fn doctor_handler<D, W>(
    State(service): SharedService<D, W>,
    Path(doctor_id): Path<String>,
) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    let id = DoctorId(doctor_id);
    match service.doctor(&id) {
        Ok(record) => {
            let payload = json!({
                "doctor": record,
                "tier": service.tier_of(&id).label(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_metrics_handler<D, W>(
    State(service): SharedService<D, W>,
    Path(doctor_id): Path<String>,
    axum::Json(metrics): axum::Json<MetricSet>,
) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    let outcome = match run_blocking(move || {
        service.update_metrics(&DoctorId(doctor_id), metrics)
    })
    .await
    {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ImportQuery {
    #[serde(default)]
    mode: CommitMode,
}

pub(crate) async fn import_handler<D, W>(
    State(service): SharedService<D, W>,
    Query(query): Query<ImportQuery>,
    body: String,
) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    let outcome = match run_blocking(move || service.import(&body, query.mode)).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn preview_handler<D, W>(
    State(service): SharedService<D, W>,
    body: String,
) -> Response
where
    D: DoctorRepository + 'static,
    W: WeightConfigStore + 'static,
{
    let outcome = match run_blocking(move || service.preview_import(&body)).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };
    match outcome {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn template_handler() -> Response {
    let template = template();
    match template.to_csv() {
        Ok(csv) => {
            let payload = json!({
                "template": template,
                "csv": csv,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error.into()),
    }
}

fn error_response(error: RankingServiceError) -> Response {
    let status = match &error {
        RankingServiceError::Weights(WeightConfigError::Invalid(validation)) => {
            let payload = json!({
                "error": error.to_string(),
                "violations": validation.violations,
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
        RankingServiceError::Weights(WeightConfigError::MissingName) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RankingServiceError::Weights(WeightConfigError::NotFound(_))
        | RankingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        RankingServiceError::Weights(WeightConfigError::ActiveConfiguration(_))
        | RankingServiceError::Weights(WeightConfigError::DuplicateName(_))
        | RankingServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        RankingServiceError::Import(
            ImportError::EmptyInput | ImportError::MissingHeader | ImportError::Csv(_),
        ) => StatusCode::BAD_REQUEST,
        RankingServiceError::Weights(WeightConfigError::Store(_))
        | RankingServiceError::Repository(RepositoryError::Unavailable(_))
        | RankingServiceError::Import(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
