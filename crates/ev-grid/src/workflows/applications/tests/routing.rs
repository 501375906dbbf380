use super::common::*;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::config::UnmatchedPolicy;
use crate::workflows::applications::application_router;
use crate::workflows::applications::domain::ApplicationSubmission;
use crate::workflows::applications::router::{approve_handler, ApproveQuery};

fn submit_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/household-applications")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn post(uri: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn submit_route_accepts_application() {
    let (service, _, district) = build_service(UnmatchedPolicy::ApproveUnassigned);
    let router = application_router(Arc::new(service));

    let response = router
        .oneshot(submit_request(json!({ "district_id": district.id.0 })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("pending"));
    assert_eq!(payload["coordinate_source"], json!("district_centroid"));
    assert_eq!(payload["latitude"], json!(10.0));
}

#[tokio::test]
async fn submit_route_reports_unknown_district_as_unprocessable() {
    let (service, _, _) = build_service(UnmatchedPolicy::ApproveUnassigned);
    let router = application_router(Arc::new(service));

    let response = router
        .oneshot(submit_request(json!({ "district_id": 404 })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], json!("reference_error"));
}

#[tokio::test]
async fn approve_route_returns_household_then_conflict() {
    let (service, catalog, district) = build_service(UnmatchedPolicy::ApproveUnassigned);
    let near = station(&catalog, &district, "S1", 10.0, 76.0);
    station(&catalog, &district, "S2", 10.5, 76.5);
    let application = service
        .submit(ApplicationSubmission::at(district.id, 10.01, 76.01))
        .expect("submitted");
    let router = application_router(Arc::new(service));

    let uri = format!(
        "/api/v1/household-applications/{}/approve?radius=10",
        application.id.0
    );
    let response = router
        .clone()
        .oneshot(post(uri.clone()))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("approved"));
    assert_eq!(payload["household"]["associated_station_id"], json!(near.id.0));

    let response = router.oneshot(post(uri)).await.expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], json!("invalid_state"));
}

#[tokio::test]
async fn approve_handler_falls_back_to_default_radius() {
    let (service, catalog, district) = build_service(UnmatchedPolicy::ApproveUnassigned);
    let near = station(&catalog, &district, "S1", 10.05, 76.05);
    let application = service
        .submit(ApplicationSubmission::at_centroid(district.id))
        .expect("submitted");

    let response = approve_handler(
        State(Arc::new(service)),
        Path(application.id.0),
        Query(ApproveQuery::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["household"]["associated_station_id"], json!(near.id.0));
}

#[tokio::test]
async fn approve_route_rejects_non_positive_radius() {
    let (service, _, district) = build_service(UnmatchedPolicy::ApproveUnassigned);
    let application = service
        .submit(ApplicationSubmission::at_centroid(district.id))
        .expect("submitted");
    let router = application_router(Arc::new(service));

    let response = router
        .oneshot(post(format!(
            "/api/v1/household-applications/{}/approve?radius=0",
            application.id.0
        )))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn keep_pending_policy_surfaces_conflict() {
    let (service, _, district) = build_service(UnmatchedPolicy::KeepPending);
    let application = service
        .submit(ApplicationSubmission::at_centroid(district.id))
        .expect("submitted");
    let router = application_router(Arc::new(service));

    let response = router
        .oneshot(post(format!(
            "/api/v1/household-applications/{}/approve",
            application.id.0
        )))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], json!("conflict_error"));
}

#[tokio::test]
async fn reject_and_status_routes_report_decision() {
    let (service, _, district) = build_service(UnmatchedPolicy::ApproveUnassigned);
    let application = service
        .submit(ApplicationSubmission::at_centroid(district.id))
        .expect("submitted");
    let router = application_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(post(format!(
            "/api/v1/household-applications/{}/reject",
            application.id.0
        )))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/api/v1/household-applications/{}", application.id.0))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("rejected"));

    let response = router
        .oneshot(
            Request::get("/api/v1/household-applications/pending")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(read_json_body(response).await, json!([]));
}

#[tokio::test]
async fn status_route_returns_not_found_for_unknown_application() {
    let (service, _, _) = build_service(UnmatchedPolicy::ApproveUnassigned);
    let router = application_router(Arc::new(service));

    let response = router
        .oneshot(
            Request::get("/api/v1/household-applications/42")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
