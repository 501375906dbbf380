use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use ev_grid::catalog::{catalog_router, CatalogService, CatalogStore};
use ev_grid::workflows::applications::{
    application_router, ApplicationRepository, HouseholdApplicationService,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_service_routes<C, R>(
    catalog: Arc<CatalogService<C>>,
    applications: Arc<HouseholdApplicationService<C, R>>,
) -> Router
where
    C: CatalogStore + 'static,
    R: ApplicationRepository + 'static,
{
    catalog_router(catalog)
        .merge(application_router(applications))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::Services;
    use axum::body::Body;
    use axum::http::Request;
    use ev_grid::config::MatchingConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(ready: bool) -> (Router, Services) {
        let services = Services::in_memory(MatchingConfig::default());
        services.seed(None).expect("bundled seed");
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let router = with_service_routes(
            services.catalog_service.clone(),
            services.applications.clone(),
        )
        .layer(Extension(state));
        (router, services)
    }

    async fn read_json_body(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let (router, _) = app(false);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let state = AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        state.readiness.store(true, Ordering::Release);
        let response = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_and_catalog_routes_share_one_router() {
        let (router, _) = app(true);
        let response = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(read_json_body(response).await, json!({ "status": "ok" }));

        let response = router
            .oneshot(Request::get("/api/v1/states").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        let payload = read_json_body(response).await;
        let names: Vec<_> = payload
            .as_array()
            .expect("array")
            .iter()
            .map(|state| state["name"].clone())
            .collect();
        assert_eq!(
            names,
            vec![json!("Kerala"), json!("Karnataka"), json!("Maharashtra")]
        );
    }

    #[tokio::test]
    async fn submitted_application_is_approved_through_merged_router() {
        let (router, services) = app(true);
        let kerala = services
            .catalog_service
            .queries()
            .list_states()
            .expect("states")[0]
            .id;
        let trivandrum = services
            .catalog_service
            .queries()
            .list_districts(kerala)
            .expect("districts")[0]
            .id;

        let response = router
            .clone()
            .oneshot(
                Request::post("/api/v1/household-applications")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "district_id": trivandrum.0 }).to_string()))
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let application = read_json_body(response).await;

        let uri = format!(
            "/api/v1/household-applications/{}/approve",
            application["id"]
        );
        let response = router
            .oneshot(Request::post(uri).body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert!(payload["household"]["associated_station_id"].is_u64());
    }
}
