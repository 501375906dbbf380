use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::domain::{
    District, DistrictId, Household, HouseholdId, NewDistrict, NewStation, State, StateId,
    Station, StationId,
};
use super::store::{
    CatalogError, CatalogStore, DistrictRemoval, HouseholdPlacement, MatchedHousehold,
    StationRemoval,
};
use crate::config::MatchingConfig;
use crate::error::FailureKind;
use crate::geo::Coordinate;
use crate::queries::CatalogQueries;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DistrictInput {
    pub name: String,
    pub state_id: StateId,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub solar_flux: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationInput {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub district_id: DistrictId,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HouseholdInput {
    pub latitude: f64,
    pub longitude: f64,
    pub district_id: DistrictId,
}

/// Administrative catalog operations plus the read side the routers need.
pub struct CatalogService<C> {
    catalog: Arc<C>,
    queries: CatalogQueries<C>,
    matching: MatchingConfig,
}

impl<C> CatalogService<C>
where
    C: CatalogStore + 'static,
{
    pub fn new(catalog: Arc<C>, matching: MatchingConfig) -> Self {
        Self {
            queries: CatalogQueries::new(catalog.clone(), matching.default_radius_km),
            catalog,
            matching,
        }
    }

    pub fn queries(&self) -> &CatalogQueries<C> {
        &self.queries
    }

    pub fn create_state(&self, name: &str) -> Result<State, CatalogServiceError> {
        let state = self.catalog.create_state(name)?;
        info!(state_id = %state.id, name = %state.name, "state created");
        Ok(state)
    }

    pub fn create_district(&self, input: DistrictInput) -> Result<District, CatalogServiceError> {
        let centroid = match (input.latitude, input.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)?),
            (None, None) => None,
            _ => {
                return Err(CatalogError::InvalidArgument(
                    "district centroid needs both latitude and longitude".to_string(),
                )
                .into())
            }
        };

        let district = self.catalog.create_district(NewDistrict {
            name: input.name,
            state_id: input.state_id,
            centroid,
            solar_flux: input.solar_flux,
        })?;
        info!(district_id = %district.id, state_id = %district.state_id, "district created");
        Ok(district)
    }

    pub fn add_station(&self, input: StationInput) -> Result<Station, CatalogServiceError> {
        let location = Coordinate::new(input.latitude, input.longitude)?;
        let station = self.catalog.create_station(NewStation {
            name: input.name,
            location,
            district_id: input.district_id,
        })?;
        info!(station_id = %station.id, district_id = %station.district_id, "station added");
        Ok(station)
    }

    /// Manual entry admits the household directly and assigns the nearest in-district
    /// station within the default radius, if any.
    pub fn add_household(&self, input: HouseholdInput) -> Result<Household, CatalogServiceError> {
        let location = Coordinate::new(input.latitude, input.longitude)?;
        let MatchedHousehold { household, station } =
            self.catalog.create_matched_household(HouseholdPlacement {
                location,
                district_id: input.district_id,
                radius_km: self.matching.default_radius_km,
                station_required: false,
            })?;
        info!(
            household_id = %household.id,
            district_id = %household.district_id,
            station = ?household.associated_station_id,
            distance_km = ?station.as_ref().map(|m| m.distance_km),
            "household added"
        );
        Ok(household)
    }

    pub fn delete_household(&self, id: HouseholdId) -> Result<Household, CatalogServiceError> {
        let household = self.catalog.delete_household(id)?;
        info!(household_id = %id, "household deleted");
        Ok(household)
    }

    pub fn delete_station(&self, id: StationId) -> Result<StationRemoval, CatalogServiceError> {
        let removal = self.catalog.delete_station(id)?;
        info!(
            station_id = %id,
            unassigned = removal.unassigned_households.len(),
            "station deleted"
        );
        Ok(removal)
    }

    pub fn delete_district(
        &self,
        id: DistrictId,
        cascade: bool,
    ) -> Result<DistrictRemoval, CatalogServiceError> {
        match self.catalog.delete_district(id, cascade) {
            Ok(removal) => {
                info!(
                    district_id = %id,
                    cascade,
                    stations = removal.removed_stations.len(),
                    households = removal.removed_households.len(),
                    "district deleted"
                );
                Ok(removal)
            }
            Err(err @ CatalogError::DistrictNotEmpty { .. }) => {
                warn!(district_id = %id, error = %err, "district delete blocked");
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogServiceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl CatalogServiceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CatalogServiceError::Catalog(err) => err.kind(),
        }
    }
}

impl From<crate::geo::CoordinateError> for CatalogServiceError {
    fn from(value: crate::geo::CoordinateError) -> Self {
        Self::Catalog(CatalogError::Coordinate(value))
    }
}
