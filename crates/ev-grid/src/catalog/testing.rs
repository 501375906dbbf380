use std::sync::Mutex;

use super::domain::{
    District, DistrictId, Household, HouseholdId, NewDistrict, NewHousehold, NewStation, State,
    StateId, Station, StationId,
};
use super::store::{
    CatalogError, CatalogStore, DistrictRemoval, HouseholdPlacement, InMemoryCatalog,
    MatchedHousehold, StationLoad, StationRemoval,
};

/// In-memory catalog where an admin deletes one station right before the next
/// household insert, as a concurrent delete landing after the caller picked that station.
#[derive(Debug, Default)]
pub(crate) struct StationDeletedBeforeInsert {
    pub(crate) inner: InMemoryCatalog,
    doomed: Mutex<Option<StationId>>,
}

impl StationDeletedBeforeInsert {
    pub(crate) fn delete_before_next_insert(&self, station_id: StationId) {
        *self.doomed.lock().expect("doomed station lock") = Some(station_id);
    }

    fn delete_doomed(&self) {
        let doomed = self.doomed.lock().expect("doomed station lock").take();
        if let Some(station_id) = doomed {
            self.inner
                .delete_station(station_id)
                .expect("doomed station deleted");
        }
    }
}

impl CatalogStore for StationDeletedBeforeInsert {
    fn create_state(&self, name: &str) -> Result<State, CatalogError> {
        self.inner.create_state(name)
    }

    fn create_district(&self, district: NewDistrict) -> Result<District, CatalogError> {
        self.inner.create_district(district)
    }

    fn create_station(&self, station: NewStation) -> Result<Station, CatalogError> {
        self.inner.create_station(station)
    }

    fn create_household(&self, household: NewHousehold) -> Result<Household, CatalogError> {
        self.delete_doomed();
        self.inner.create_household(household)
    }

    fn create_matched_household(
        &self,
        placement: HouseholdPlacement,
    ) -> Result<MatchedHousehold, CatalogError> {
        self.delete_doomed();
        self.inner.create_matched_household(placement)
    }

    fn state(&self, id: StateId) -> Result<State, CatalogError> {
        self.inner.state(id)
    }

    fn district(&self, id: DistrictId) -> Result<District, CatalogError> {
        self.inner.district(id)
    }

    fn station(&self, id: StationId) -> Result<Station, CatalogError> {
        self.inner.station(id)
    }

    fn household(&self, id: HouseholdId) -> Result<Household, CatalogError> {
        self.inner.household(id)
    }

    fn states(&self) -> Result<Vec<State>, CatalogError> {
        self.inner.states()
    }

    fn districts_in_state(&self, state_id: StateId) -> Result<Vec<District>, CatalogError> {
        self.inner.districts_in_state(state_id)
    }

    fn stations_in_district(
        &self,
        district_id: DistrictId,
    ) -> Result<Vec<Station>, CatalogError> {
        self.inner.stations_in_district(district_id)
    }

    fn households_in_district(
        &self,
        district_id: DistrictId,
    ) -> Result<Vec<Household>, CatalogError> {
        self.inner.households_in_district(district_id)
    }

    fn households_assigned_to(
        &self,
        station_id: StationId,
    ) -> Result<Vec<Household>, CatalogError> {
        self.inner.households_assigned_to(station_id)
    }

    fn station_loads(&self) -> Result<Vec<StationLoad>, CatalogError> {
        self.inner.station_loads()
    }

    fn household_count(&self) -> Result<usize, CatalogError> {
        self.inner.household_count()
    }

    fn assign_station(
        &self,
        household_id: HouseholdId,
        station_id: Option<StationId>,
    ) -> Result<Household, CatalogError> {
        self.inner.assign_station(household_id, station_id)
    }

    fn delete_household(&self, id: HouseholdId) -> Result<Household, CatalogError> {
        self.inner.delete_household(id)
    }

    fn delete_station(&self, id: StationId) -> Result<StationRemoval, CatalogError> {
        self.inner.delete_station(id)
    }

    fn delete_district(
        &self,
        id: DistrictId,
        cascade: bool,
    ) -> Result<DistrictRemoval, CatalogError> {
        self.inner.delete_district(id, cascade)
    }
}
