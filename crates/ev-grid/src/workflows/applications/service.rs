use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationSubmission, CoordinateSource,
};
use super::repository::{ApplicationRepository, RepositoryError};
use crate::catalog::{
    CatalogError, CatalogStore, DistrictId, EntityKind, Household, HouseholdPlacement,
    MatchedHousehold,
};
use crate::config::{MatchingConfig, UnmatchedPolicy};
use crate::error::FailureKind;
use crate::geo::{Coordinate, CoordinateError};
use crate::matching::{validate_radius, MatchError};

/// Service composing the catalog and the application repository.
pub struct HouseholdApplicationService<C, R> {
    catalog: Arc<C>,
    repository: Arc<R>,
    matching: MatchingConfig,
    /// Serializes the check-status-then-transition sequence of approve and reject.
    decisions: Mutex<()>,
}

impl<C, R> HouseholdApplicationService<C, R>
where
    C: CatalogStore + 'static,
    R: ApplicationRepository + 'static,
{
    pub fn new(catalog: Arc<C>, repository: Arc<R>, matching: MatchingConfig) -> Self {
        Self {
            catalog,
            repository,
            matching,
            decisions: Mutex::new(()),
        }
    }

    pub fn default_radius_km(&self) -> f64 {
        self.matching.default_radius_km
    }

    /// Submit a new application, returning the repository-backed record in `pending`.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<Application, ApplicationServiceError> {
        let district = self.catalog.district(submission.district_id).map_err(|err| match err {
            CatalogError::NotFound { id, .. } => CatalogError::MissingReference {
                kind: EntityKind::District,
                id,
            },
            other => other,
        })?;

        let (location, coordinate_source) = match (submission.latitude, submission.longitude) {
            (Some(latitude), Some(longitude)) => (
                Coordinate::new(latitude, longitude)?,
                CoordinateSource::Declared,
            ),
            (None, None) => match district.centroid() {
                Some(centroid) => (centroid, CoordinateSource::DistrictCentroid),
                None => return Err(ApplicationServiceError::MissingCoordinates(district.id)),
            },
            _ => {
                return Err(ApplicationServiceError::InvalidArgument(
                    "latitude and longitude must be supplied together".to_string(),
                ))
            }
        };

        let application = Application {
            id: self.repository.next_id()?,
            district_id: district.id,
            latitude: location.latitude,
            longitude: location.longitude,
            coordinate_source,
            status: ApplicationStatus::Pending,
            submitted_at: Utc::now(),
            decided_at: None,
            household_id: None,
        };

        let stored = self.repository.insert(application)?;
        info!(
            application_id = %stored.id,
            district_id = %stored.district_id,
            source = ?stored.coordinate_source,
            "application submitted"
        );
        Ok(stored)
    }

    /// Admit a pending application as a household and assign the nearest in-district
    /// station within `radius_km`. Succeeds at most once per application.
    pub fn approve(
        &self,
        application_id: ApplicationId,
        radius_km: f64,
    ) -> Result<Household, ApplicationServiceError> {
        let radius_km = validate_radius(radius_km)?;
        let _decision = self.decisions.lock().unwrap_or_else(PoisonError::into_inner);

        let mut application = self.pending_application(application_id)?;
        let placement = HouseholdPlacement {
            location: application.location(),
            district_id: application.district_id,
            radius_km,
            station_required: self.matching.unmatched == UnmatchedPolicy::KeepPending,
        };
        let MatchedHousehold {
            household,
            station: nearest,
        } = match self.catalog.create_matched_household(placement) {
            Ok(placed) => placed,
            Err(CatalogError::NoStationInRange { .. }) => {
                warn!(%application_id, radius_km, "no station in range; application kept pending");
                return Err(ApplicationServiceError::NoStationInRange {
                    id: application_id,
                    radius_km,
                });
            }
            Err(err) => return Err(err.into()),
        };

        application.status = ApplicationStatus::Approved;
        application.decided_at = Some(Utc::now());
        application.household_id = Some(household.id);

        if let Err(err) = self.repository.update(application) {
            // Keep the catalog consistent with the application that is still pending.
            if let Err(cleanup) = self.catalog.delete_household(household.id) {
                warn!(household_id = %household.id, error = %cleanup, "orphaned household");
            }
            return Err(err.into());
        }

        match &nearest {
            Some(found) => info!(
                %application_id,
                household_id = %household.id,
                station_id = %found.station.id,
                distance_km = found.distance_km,
                "application approved"
            ),
            None => warn!(
                %application_id,
                household_id = %household.id,
                radius_km,
                "application approved without a station in range"
            ),
        }

        Ok(household)
    }

    pub fn reject(
        &self,
        application_id: ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        let _decision = self.decisions.lock().unwrap_or_else(PoisonError::into_inner);

        let mut application = self.pending_application(application_id)?;
        application.status = ApplicationStatus::Rejected;
        application.decided_at = Some(Utc::now());
        self.repository.update(application.clone())?;

        info!(%application_id, "application rejected");
        Ok(application)
    }

    /// Fetch an application and current status for API responses.
    pub fn get(
        &self,
        application_id: ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        self.repository
            .fetch(application_id)?
            .ok_or(ApplicationServiceError::NotFound(application_id))
    }

    pub fn pending(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<Application>, ApplicationServiceError> {
        Ok(self.repository.pending(limit.unwrap_or(usize::MAX))?)
    }

    fn pending_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        let application = self.get(application_id)?;
        if application.status.is_terminal() {
            return Err(ApplicationServiceError::InvalidState {
                id: application_id,
                status: application.status,
            });
        }
        Ok(application)
    }
}

/// Error raised by the application service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("application {id} is already {status}")]
    InvalidState {
        id: ApplicationId,
        status: ApplicationStatus,
    },
    #[error("{0} has no centroid and no coordinates were supplied")]
    MissingCoordinates(DistrictId),
    #[error("no station within {radius_km} km of application {id}")]
    NoStationInRange { id: ApplicationId, radius_km: f64 },
    #[error("{0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Matching(#[from] MatchError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApplicationServiceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApplicationServiceError::NotFound(_) => FailureKind::NotFound,
            ApplicationServiceError::InvalidState { .. } => FailureKind::InvalidState,
            ApplicationServiceError::MissingCoordinates(_) => FailureKind::MissingCoordinates,
            ApplicationServiceError::NoStationInRange { .. } => FailureKind::ConflictError,
            ApplicationServiceError::InvalidArgument(_)
            | ApplicationServiceError::Coordinate(_) => FailureKind::InvalidArgument,
            ApplicationServiceError::Catalog(err) => err.kind(),
            ApplicationServiceError::Matching(err) => err.kind(),
            ApplicationServiceError::Repository(err) => err.kind(),
        }
    }
}
