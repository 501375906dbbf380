use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{DistrictId, HouseholdId, StateId, StationId};
use super::service::{CatalogService, DistrictInput, HouseholdInput, StationInput};
use super::store::CatalogStore;
use crate::error::failure_response;

#[derive(Debug, Deserialize)]
pub(crate) struct CreateStateRequest {
    pub(crate) name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RadiusQuery {
    #[serde(default)]
    pub(crate) radius: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CascadeQuery {
    #[serde(default)]
    pub(crate) cascade: bool,
}

/// Router builder exposing catalog listings, admin edits and nearest-station lookups.
pub fn catalog_router<C>(service: Arc<CatalogService<C>>) -> Router
where
    C: CatalogStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/states",
            get(list_states_handler::<C>).post(create_state_handler::<C>),
        )
        .route(
            "/api/v1/states/:state_id/districts",
            get(list_districts_handler::<C>),
        )
        .route("/api/v1/districts", post(create_district_handler::<C>))
        .route(
            "/api/v1/districts/:district_id",
            delete(delete_district_handler::<C>),
        )
        .route(
            "/api/v1/districts/:district_id/stations",
            get(list_stations_handler::<C>),
        )
        .route(
            "/api/v1/districts/:district_id/households",
            get(list_households_handler::<C>),
        )
        .route("/api/v1/stations", post(add_station_handler::<C>))
        .route(
            "/api/v1/stations/:station_id",
            delete(delete_station_handler::<C>),
        )
        .route("/api/v1/households", post(add_household_handler::<C>))
        .route(
            "/api/v1/households/:household_id",
            delete(delete_household_handler::<C>),
        )
        .route(
            "/api/v1/households/:household_id/nearest-station",
            get(nearest_station_handler::<C>),
        )
        .route("/api/v1/analytics/summary", get(summary_handler::<C>))
        .with_state(service)
}

pub(crate) async fn list_states_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
) -> Response
where
    C: CatalogStore + 'static,
{
    match service.queries().list_states() {
        Ok(states) => (StatusCode::OK, Json(states)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn create_state_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Json(request): Json<CreateStateRequest>,
) -> Response
where
    C: CatalogStore + 'static,
{
    match service.create_state(&request.name) {
        Ok(state) => (StatusCode::CREATED, Json(state)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn list_districts_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(state_id): Path<u64>,
) -> Response
where
    C: CatalogStore + 'static,
{
    match service.queries().list_districts(StateId(state_id)) {
        Ok(districts) => (StatusCode::OK, Json(districts)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn create_district_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Json(input): Json<DistrictInput>,
) -> Response
where
    C: CatalogStore + 'static,
{
    match service.create_district(input) {
        Ok(district) => (StatusCode::CREATED, Json(district)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn delete_district_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(district_id): Path<u64>,
    Query(query): Query<CascadeQuery>,
) -> Response
where
    C: CatalogStore + 'static,
{
    match service.delete_district(DistrictId(district_id), query.cascade) {
        Ok(removal) => (StatusCode::OK, Json(removal)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn list_stations_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(district_id): Path<u64>,
) -> Response
where
    C: CatalogStore + 'static,
{
    match service.queries().list_stations(DistrictId(district_id)) {
        Ok(stations) => (StatusCode::OK, Json(stations)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn list_households_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(district_id): Path<u64>,
) -> Response
where
    C: CatalogStore + 'static,
{
    match service.queries().list_households(DistrictId(district_id)) {
        Ok(households) => (StatusCode::OK, Json(households)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn add_station_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Json(input): Json<StationInput>,
) -> Response
where
    C: CatalogStore + 'static,
{
    match service.add_station(input) {
        Ok(station) => (StatusCode::CREATED, Json(station)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn delete_station_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(station_id): Path<u64>,
) -> Response
where
    C: CatalogStore + 'static,
{
    match service.delete_station(StationId(station_id)) {
        Ok(removal) => {
            let payload = json!({
                "detail": "station deleted",
                "station_id": removal.station.id,
                "unassigned_count": removal.unassigned_households.len(),
                "unassigned_households": removal.unassigned_households,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn add_household_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Json(input): Json<HouseholdInput>,
) -> Response
where
    C: CatalogStore + 'static,
{
    match service.add_household(input) {
        Ok(household) => (StatusCode::CREATED, Json(household)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn delete_household_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(household_id): Path<u64>,
) -> Response
where
    C: CatalogStore + 'static,
{
    match service.delete_household(HouseholdId(household_id)) {
        Ok(household) => {
            let payload = json!({
                "detail": "household deleted",
                "household_id": household.id,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn nearest_station_handler<C>(
    State(service): State<Arc<CatalogService<C>>>,
    Path(household_id): Path<u64>,
    Query(query): Query<RadiusQuery>,
) -> Response
where
    C: CatalogStore + 'static,
{
    match service
        .queries()
        .nearest_station(HouseholdId(household_id), query.radius)
    {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}

pub(crate) async fn summary_handler<C>(State(service): State<Arc<CatalogService<C>>>) -> Response
where
    C: CatalogStore + 'static,
{
    match service.queries().station_load_summary() {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => failure_response(err.kind(), err.to_string()),
    }
}
