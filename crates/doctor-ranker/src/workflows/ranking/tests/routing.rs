use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::storage::InMemoryWeightStore;
use crate::workflows::ranking::RankingService;

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn invalid_weight_sum_is_unprocessable() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/weights",
            json!({
                "name": "lopsided",
                "influence_weight": 0.7,
                "activity_weight": 0.3,
                "quality_weight": 0.3
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["violations"][0]["kind"], "invalid_weight_sum");
}

#[tokio::test]
async fn medical_configuration_is_created() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/weights",
            json!({
                "name": "clinical",
                "description": "medical layout",
                "account_influence_weight": 25,
                "cost_effectiveness_weight": 30,
                "content_quality_weight": 25,
                "medical_credibility_weight": 10,
                "roi_prediction_weight": 10,
                "is_default": true
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["name"], "clinical");
    assert_eq!(body["is_default"], true);
    assert_eq!(body["roi_prediction_weight"], 10.0);
}

#[tokio::test]
async fn duplicate_configuration_name_conflicts() {
    let (service, _, _) = build_service();
    service
        .save_configuration(reach_draft("reach", false))
        .expect("seed configuration");
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/weights",
            serde_json::to_value(reach_draft("reach", false)).unwrap(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn deleting_active_configuration_conflicts() {
    let (service, _, _) = build_service();
    let active = service
        .save_configuration(reach_draft("reach", true))
        .expect("seed configuration");
    let router = router_with_service(service);

    let response = router
        .oneshot(empty_request(
            "DELETE",
            &format!("/api/v1/weights/{}", active.id),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn activate_unknown_configuration_is_not_found() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(empty_request("POST", "/api/v1/weights/42/activate"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dry_validation_reports_sum_without_saving() {
    let (service, _, weights) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/weights/validate",
            json!({
                "influence_weight": 0.5,
                "activity_weight": 0.3,
                "quality_weight": 0.1
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["declared_total"], 1.0);
    assert!(crate::workflows::weights::WeightConfigStore::list(weights.as_ref())
        .expect("list")
        .is_empty());
}

#[tokio::test]
async fn active_endpoint_falls_back_to_system_default() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(empty_request("GET", "/api/v1/weights/active"))
        .await
        .unwrap();

    let body = read_json_body(response).await;
    assert_eq!(body["id"], Value::Null);
    assert_eq!(body["name"], "system default");
}

#[tokio::test]
async fn recalculate_returns_processed_count() {
    let router = router_with_service(seeded_service());

    let response = router
        .oneshot(empty_request("POST", "/api/v1/scores/recalculate"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["processedCount"], 3);
}

#[tokio::test]
async fn standings_are_ordered_with_camel_case_fields() {
    let service = seeded_service();
    service.recalculate().expect("standings");
    let router = router_with_service(service);

    let response = router
        .oneshot(empty_request("GET", "/api/v1/scores"))
        .await
        .unwrap();

    let body = read_json_body(response).await;
    let entries = body["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[0]["id"], "d-1");
    assert!(entries[0]["compositeScore"].as_f64().is_some());
    assert!(entries[0]["subScores"]["influence"].as_f64().is_some());
    assert!(entries[0]["tier"].is_string());
}

#[tokio::test]
async fn import_endpoint_returns_row_report() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/import?mode=upsert")
                .header(header::CONTENT_TYPE, "text/csv")
                .body(Body::from(IMPORT_PAYLOAD))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["totalRecords"], 3);
    assert_eq!(body["successCount"], 2);
    assert_eq!(body["failedCount"], 1);
    assert_eq!(
        body["errors"],
        json!([{"row": 2, "field": "name", "message": "required"}])
    );
    assert_eq!(body["recalculation"]["processedCount"], 2);
}

#[tokio::test]
async fn empty_import_is_bad_request() {
    let (service, _, _) = build_service();
    let response = crate::workflows::ranking::router::preview_handler(
        State(Arc::new(service)),
        String::new(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn template_endpoint_exposes_csv() {
    let response = crate::workflows::ranking::router::template_handler().await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert!(body["csv"].as_str().expect("csv").starts_with("id,name"));
    assert_eq!(body["template"]["headers"][1], "name");
}

#[tokio::test]
async fn repository_outage_is_internal_error() {
    let service = Arc::new(RankingService::new(
        Arc::new(UnavailableRepository),
        Arc::new(InMemoryWeightStore::default()),
        &ranking_config(),
    ));

    let response = crate::workflows::ranking::router::recalculate_handler(State(service)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn metric_update_for_unknown_doctor_is_not_found() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "PUT",
            "/api/v1/doctors/ghost/metrics",
            json!({"total_followers": 10, "total_likes": 0, "total_works": 0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mixed_shape_payload_is_rejected() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/weights",
            json!({
                "name": "hybrid",
                "influence_weight": 0.5,
                "activity_weight": 0.3,
                "quality_weight": 0.2,
                "roi_prediction_weight": 5.0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn presets_endpoint_lists_medical_strategies() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(empty_request("GET", "/api/v1/weights/presets"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let strategies: Vec<&str> = body
        .as_array()
        .expect("preset list")
        .iter()
        .filter_map(|preset| preset["strategy"].as_str())
        .collect();
    assert_eq!(
        strategies,
        vec!["conservative", "aggressive", "balanced", "brand_focused"]
    );
    assert_eq!(body[0]["weights"]["cost_effectiveness_weight"], 40.0);
}

#[tokio::test]
async fn analyze_endpoint_reports_concentration_and_validity() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/weights/analyze",
            json!({
                "account_influence_weight": 60.0,
                "cost_effectiveness_weight": 10.0,
                "content_quality_weight": 20.0,
                "medical_credibility_weight": 5.0,
                "roi_prediction_weight": 5.0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["impact"]["dominant_factor"], "account_influence");
    assert_eq!(body["impact"]["risk_level"], "high");
    assert_eq!(body["impact"]["balance_score"], 20.0);
    assert_eq!(body["validation"]["valid"], true);
}

#[tokio::test]
async fn ranking_work_runs_off_the_request_thread() {
    let caller = std::thread::current().id();

    let worker = crate::workflows::ranking::router::run_blocking(|| std::thread::current().id())
        .await
        .expect("blocking task");

    assert_ne!(worker, caller);
}
