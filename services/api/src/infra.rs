use ev_grid::catalog::{CatalogService, InMemoryCatalog};
use ev_grid::config::MatchingConfig;
use ev_grid::seed::{self, SeedError, SeedReport};
use ev_grid::workflows::applications::{
    HouseholdApplicationService, InMemoryApplicationRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ApplicationService =
    HouseholdApplicationService<InMemoryCatalog, InMemoryApplicationRepository>;

/// In-memory wiring shared by the server, the demo and the catalog commands.
pub(crate) struct Services {
    pub(crate) catalog: Arc<InMemoryCatalog>,
    pub(crate) catalog_service: Arc<CatalogService<InMemoryCatalog>>,
    pub(crate) applications: Arc<ApplicationService>,
}

impl Services {
    pub(crate) fn in_memory(matching: MatchingConfig) -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        let catalog_service = Arc::new(CatalogService::new(catalog.clone(), matching));
        let applications = Arc::new(HouseholdApplicationService::new(
            catalog.clone(),
            Arc::new(InMemoryApplicationRepository::new()),
            matching,
        ));
        Self {
            catalog,
            catalog_service,
            applications,
        }
    }

    /// Seed from `seed_dir` when given, otherwise from the bundled data set.
    pub(crate) fn seed(&self, seed_dir: Option<&Path>) -> Result<SeedReport, SeedError> {
        match seed_dir {
            Some(dir) => seed::seed_from_dir(self.catalog.as_ref(), dir),
            None => seed::seed_bundled(self.catalog.as_ref()),
        }
    }
}
