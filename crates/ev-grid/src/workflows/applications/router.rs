use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationId, ApplicationStatus, ApplicationSubmission};
use super::repository::ApplicationRepository;
use super::service::HouseholdApplicationService;
use crate::catalog::CatalogStore;
use crate::error::failure_response;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApproveQuery {
    #[serde(default)]
    pub(crate) radius: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PendingQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

/// Router builder exposing intake, review queue, and decision endpoints.
pub fn application_router<C, R>(service: Arc<HouseholdApplicationService<C, R>>) -> Router
where
    C: CatalogStore + 'static,
    R: ApplicationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/household-applications",
            post(submit_handler::<C, R>),
        )
        .route(
            "/api/v1/household-applications/pending",
            get(pending_handler::<C, R>),
        )
        .route(
            "/api/v1/household-applications/:application_id",
            get(status_handler::<C, R>),
        )
        .route(
            "/api/v1/household-applications/:application_id/approve",
            post(approve_handler::<C, R>),
        )
        .route(
            "/api/v1/household-applications/:application_id/reject",
            post(reject_handler::<C, R>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<C, R>(
    State(service): State<Arc<HouseholdApplicationService<C, R>>>,
    Json(submission): Json<ApplicationSubmission>,
) -> Response
where
    C: CatalogStore + 'static,
    R: ApplicationRepository + 'static,
{
    match service.submit(submission) {
        Ok(application) => (StatusCode::ACCEPTED, Json(application)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn pending_handler<C, R>(
    State(service): State<Arc<HouseholdApplicationService<C, R>>>,
    Query(query): Query<PendingQuery>,
) -> Response
where
    C: CatalogStore + 'static,
    R: ApplicationRepository + 'static,
{
    match service.pending(query.limit) {
        Ok(applications) => (StatusCode::OK, Json(applications)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn status_handler<C, R>(
    State(service): State<Arc<HouseholdApplicationService<C, R>>>,
    Path(application_id): Path<u64>,
) -> Response
where
    C: CatalogStore + 'static,
    R: ApplicationRepository + 'static,
{
    match service.get(ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn approve_handler<C, R>(
    State(service): State<Arc<HouseholdApplicationService<C, R>>>,
    Path(application_id): Path<u64>,
    Query(query): Query<ApproveQuery>,
) -> Response
where
    C: CatalogStore + 'static,
    R: ApplicationRepository + 'static,
{
    let id = ApplicationId(application_id);
    let radius_km = query.radius.unwrap_or_else(|| service.default_radius_km());
    match service.approve(id, radius_km) {
        Ok(household) => {
            let payload = json!({
                "application_id": id,
                "status": ApplicationStatus::Approved,
                "household": household,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn reject_handler<C, R>(
    State(service): State<Arc<HouseholdApplicationService<C, R>>>,
    Path(application_id): Path<u64>,
) -> Response
where
    C: CatalogStore + 'static,
    R: ApplicationRepository + 'static,
{
    match service.reject(ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}
