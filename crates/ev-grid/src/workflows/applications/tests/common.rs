use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::catalog::{
    CatalogStore, District, InMemoryCatalog, NewDistrict, NewStation, Station,
};
use crate::config::{MatchingConfig, UnmatchedPolicy};
use crate::geo::Coordinate;
use crate::workflows::applications::domain::{Application, ApplicationId};
use crate::workflows::applications::repository::{
    ApplicationRepository, InMemoryApplicationRepository, RepositoryError,
};
use crate::workflows::applications::HouseholdApplicationService;

pub(super) type MemoryService =
    HouseholdApplicationService<InMemoryCatalog, InMemoryApplicationRepository>;

pub(super) fn point(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate {
        latitude,
        longitude,
    }
}

/// Catalog with one district centred on (10, 76).
pub(super) fn catalog_with_district() -> (Arc<InMemoryCatalog>, District) {
    let catalog = Arc::new(InMemoryCatalog::new());
    let state = catalog.create_state("Kerala").expect("state");
    let district = catalog
        .create_district(NewDistrict {
            name: "Ernakulam".to_string(),
            state_id: state.id,
            centroid: Some(point(10.0, 76.0)),
            solar_flux: Some(5.4),
        })
        .expect("district");
    (catalog, district)
}

pub(super) fn station(
    catalog: &InMemoryCatalog,
    district: &District,
    name: &str,
    latitude: f64,
    longitude: f64,
) -> Station {
    catalog
        .create_station(NewStation {
            name: name.to_string(),
            location: point(latitude, longitude),
            district_id: district.id,
        })
        .expect("station")
}

pub(super) fn build_service(
    policy: UnmatchedPolicy,
) -> (MemoryService, Arc<InMemoryCatalog>, District) {
    let (catalog, district) = catalog_with_district();
    let service = HouseholdApplicationService::new(
        catalog.clone(),
        Arc::new(InMemoryApplicationRepository::new()),
        MatchingConfig {
            unmatched: policy,
            ..MatchingConfig::default()
        },
    );
    (service, catalog, district)
}

/// Repository that accepts inserts but refuses every update.
#[derive(Default)]
pub(super) struct ReadOnlyRepository {
    pub(super) inner: InMemoryApplicationRepository,
}

impl ApplicationRepository for ReadOnlyRepository {
    fn next_id(&self) -> Result<ApplicationId, RepositoryError> {
        self.inner.next_id()
    }

    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        self.inner.insert(application)
    }

    fn update(&self, _application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn pending(&self, limit: usize) -> Result<Vec<Application>, RepositoryError> {
        self.inner.pending(limit)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
