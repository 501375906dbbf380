//! Read-only views consumed by the presentation layer.

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::{
    CatalogError, CatalogStore, District, DistrictId, Household, HouseholdId, State, StateId,
    Station, StationId, StationLoad,
};
use crate::matching::{MatchError, ProximityMatcher};

/// Household with its weak station reference resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HouseholdView {
    pub id: HouseholdId,
    pub latitude: f64,
    pub longitude: f64,
    pub district_id: DistrictId,
    pub associated_station_id: Option<StationId>,
    pub associated_station: Option<Station>,
}

/// Outcome of a nearest-station lookup; both fields are null when nothing is in range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestStationView {
    pub household_id: HouseholdId,
    pub radius_km: f64,
    pub station: Option<Station>,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationLoadSummary {
    pub total_stations: usize,
    pub total_households: usize,
    pub unassigned_households: usize,
    pub stations: Vec<StationLoad>,
}

pub struct CatalogQueries<C> {
    catalog: Arc<C>,
    matcher: ProximityMatcher<C>,
    default_radius_km: f64,
}

impl<C> CatalogQueries<C>
where
    C: CatalogStore + 'static,
{
    pub fn new(catalog: Arc<C>, default_radius_km: f64) -> Self {
        let matcher = ProximityMatcher::new(catalog.clone());
        Self {
            catalog,
            matcher,
            default_radius_km,
        }
    }

    pub fn default_radius_km(&self) -> f64 {
        self.default_radius_km
    }

    pub fn list_states(&self) -> Result<Vec<State>, CatalogError> {
        self.catalog.states()
    }

    pub fn list_districts(&self, state_id: StateId) -> Result<Vec<District>, CatalogError> {
        self.catalog.districts_in_state(state_id)
    }

    pub fn list_stations(&self, district_id: DistrictId) -> Result<Vec<Station>, CatalogError> {
        self.catalog.stations_in_district(district_id)
    }

    pub fn list_households(
        &self,
        district_id: DistrictId,
    ) -> Result<Vec<HouseholdView>, CatalogError> {
        self.catalog
            .households_in_district(district_id)?
            .into_iter()
            .map(|household| self.resolve(household))
            .collect()
    }

    /// Missing stations resolve to `None`; a stale id never surfaces as an error.
    pub fn resolve(&self, household: Household) -> Result<HouseholdView, CatalogError> {
        let associated_station = match household.associated_station_id {
            Some(station_id) => match self.catalog.station(station_id) {
                Ok(station) => Some(station),
                Err(CatalogError::NotFound { .. }) => None,
                Err(other) => return Err(other),
            },
            None => None,
        };

        Ok(HouseholdView {
            id: household.id,
            latitude: household.latitude,
            longitude: household.longitude,
            district_id: household.district_id,
            associated_station_id: associated_station.as_ref().map(|station| station.id),
            associated_station,
        })
    }

    pub fn nearest_station(
        &self,
        household_id: HouseholdId,
        radius_km: Option<f64>,
    ) -> Result<NearestStationView, MatchError> {
        let radius_km = radius_km.unwrap_or(self.default_radius_km);
        let found = self.matcher.find_nearest_station(household_id, radius_km)?;

        Ok(NearestStationView {
            household_id,
            radius_km,
            distance_km: found.as_ref().map(|m| m.distance_km),
            station: found.map(|m| m.station),
        })
    }

    pub fn station_load_summary(&self) -> Result<StationLoadSummary, CatalogError> {
        let stations = self.catalog.station_loads()?;
        let total_households = self.catalog.household_count()?;
        let assigned: usize = stations.iter().map(|load| load.household_count).sum();

        Ok(StationLoadSummary {
            total_stations: stations.len(),
            total_households,
            unassigned_households: total_households.saturating_sub(assigned),
            stations,
        })
    }
}
