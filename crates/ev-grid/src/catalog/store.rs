use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use super::domain::{
    District, DistrictId, DistrictMembers, EntityKind, Household, HouseholdId, NewDistrict,
    NewHousehold, NewStation, State, StateId, Station, StationId,
};
use crate::error::FailureKind;
use crate::geo::{Coordinate, CoordinateError};
use crate::matching::{nearest_within, validate_radius, StationMatch};

/// Storage seam for the catalog. Every method runs as one atomic unit, so ownership
/// checks and the mutation they guard cannot interleave with other writers.
pub trait CatalogStore: Send + Sync {
    fn create_state(&self, name: &str) -> Result<State, CatalogError>;
    fn create_district(&self, district: NewDistrict) -> Result<District, CatalogError>;
    fn create_station(&self, station: NewStation) -> Result<Station, CatalogError>;
    fn create_household(&self, household: NewHousehold) -> Result<Household, CatalogError>;
    /// Creates a household linked to the nearest station of its district within the
    /// placement radius. The station is chosen under the same lock as the insert, so a
    /// concurrent station delete cannot invalidate the choice. Fails with
    /// `NoStationInRange`, creating nothing, when a station is required and none is in range.
    fn create_matched_household(
        &self,
        placement: HouseholdPlacement,
    ) -> Result<MatchedHousehold, CatalogError>;

    fn state(&self, id: StateId) -> Result<State, CatalogError>;
    fn district(&self, id: DistrictId) -> Result<District, CatalogError>;
    fn station(&self, id: StationId) -> Result<Station, CatalogError>;
    fn household(&self, id: HouseholdId) -> Result<Household, CatalogError>;

    fn states(&self) -> Result<Vec<State>, CatalogError>;
    fn districts_in_state(&self, state_id: StateId) -> Result<Vec<District>, CatalogError>;
    fn stations_in_district(&self, district_id: DistrictId)
        -> Result<Vec<Station>, CatalogError>;
    fn households_in_district(
        &self,
        district_id: DistrictId,
    ) -> Result<Vec<Household>, CatalogError>;
    fn households_assigned_to(&self, station_id: StationId)
        -> Result<Vec<Household>, CatalogError>;
    fn station_loads(&self) -> Result<Vec<StationLoad>, CatalogError>;
    fn household_count(&self) -> Result<usize, CatalogError>;

    /// Set or clear the weak station reference of a household.
    fn assign_station(
        &self,
        household_id: HouseholdId,
        station_id: Option<StationId>,
    ) -> Result<Household, CatalogError>;

    fn delete_household(&self, id: HouseholdId) -> Result<Household, CatalogError>;
    /// Removes the station and clears it from every household pointing at it.
    fn delete_station(&self, id: StationId) -> Result<StationRemoval, CatalogError>;
    /// Refuses while the district owns stations or households unless `cascade` is set.
    fn delete_district(&self, id: DistrictId, cascade: bool)
        -> Result<DistrictRemoval, CatalogError>;

    fn list_by_district(
        &self,
        district_id: DistrictId,
        kind: EntityKind,
    ) -> Result<DistrictMembers, CatalogError> {
        match kind {
            EntityKind::Station => self
                .stations_in_district(district_id)
                .map(DistrictMembers::Stations),
            EntityKind::Household => self
                .households_in_district(district_id)
                .map(DistrictMembers::Households),
            other => Err(CatalogError::InvalidArgument(format!(
                "{other} is not listed by district"
            ))),
        }
    }
}

/// Where a new household goes and how far its station may be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HouseholdPlacement {
    pub location: Coordinate,
    pub district_id: DistrictId,
    pub radius_km: f64,
    pub station_required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedHousehold {
    pub household: Household,
    pub station: Option<StationMatch>,
}

/// Households served by one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationLoad {
    pub station: Station,
    pub household_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationRemoval {
    pub station: Station,
    pub unassigned_households: Vec<HouseholdId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictRemoval {
    pub district: District,
    pub removed_stations: Vec<StationId>,
    pub removed_households: Vec<HouseholdId>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("referenced {kind} {id} does not exist")]
    MissingReference { kind: EntityKind, id: u64 },
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: u64 },
    #[error("{district_id} still owns {stations} station(s) and {households} household(s)")]
    DistrictNotEmpty {
        district_id: DistrictId,
        stations: usize,
        households: usize,
    },
    #[error("no station of {district_id} within {radius_km} km")]
    NoStationInRange {
        district_id: DistrictId,
        radius_km: f64,
    },
    #[error("state '{0}' already exists")]
    DuplicateState(String),
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CatalogError::MissingReference { .. } => FailureKind::ReferenceError,
            CatalogError::NotFound { .. } => FailureKind::NotFound,
            CatalogError::DistrictNotEmpty { .. }
            | CatalogError::NoStationInRange { .. }
            | CatalogError::DuplicateState(_) => FailureKind::ConflictError,
            CatalogError::Coordinate(_) | CatalogError::InvalidArgument(_) => {
                FailureKind::InvalidArgument
            }
            CatalogError::Unavailable(_) => FailureKind::Unavailable,
        }
    }

    fn missing(kind: EntityKind, id: u64) -> Self {
        CatalogError::MissingReference { kind, id }
    }

    fn not_found(kind: EntityKind, id: u64) -> Self {
        CatalogError::NotFound { kind, id }
    }
}

#[derive(Debug, Default)]
struct Sequences {
    state: u64,
    district: u64,
    station: u64,
    household: u64,
}

fn advance(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct CatalogTables {
    sequences: Sequences,
    states: BTreeMap<StateId, State>,
    districts: BTreeMap<DistrictId, District>,
    stations: BTreeMap<StationId, Station>,
    households: BTreeMap<HouseholdId, Household>,
    districts_by_state: HashMap<StateId, BTreeSet<DistrictId>>,
    stations_by_district: HashMap<DistrictId, BTreeSet<StationId>>,
    households_by_district: HashMap<DistrictId, BTreeSet<HouseholdId>>,
    households_by_station: HashMap<StationId, BTreeSet<HouseholdId>>,
}

impl CatalogTables {
    fn require_district(&self, id: DistrictId) -> Result<&District, CatalogError> {
        self.districts
            .get(&id)
            .ok_or_else(|| CatalogError::missing(EntityKind::District, id.0))
    }

    fn require_station(&self, id: StationId) -> Result<&Station, CatalogError> {
        self.stations
            .get(&id)
            .ok_or_else(|| CatalogError::missing(EntityKind::Station, id.0))
    }

    /// Households may only reference a station of their own district.
    fn require_station_in(
        &self,
        id: StationId,
        district_id: DistrictId,
    ) -> Result<&Station, CatalogError> {
        let station = self.require_station(id)?;
        if station.district_id != district_id {
            return Err(CatalogError::InvalidArgument(format!(
                "{id} belongs to {}, not {district_id}",
                station.district_id
            )));
        }
        Ok(station)
    }

    /// Inserts a household whose references were already checked.
    fn insert_household(&mut self, household: NewHousehold) -> Household {
        let id = HouseholdId(advance(&mut self.sequences.household));
        let record = Household {
            id,
            latitude: household.location.latitude,
            longitude: household.location.longitude,
            district_id: household.district_id,
            associated_station_id: household.associated_station_id,
        };
        self.households.insert(id, record.clone());
        self.households_by_district
            .entry(household.district_id)
            .or_default()
            .insert(id);
        self.link_station(id, household.associated_station_id);
        record
    }

    fn link_station(&mut self, household_id: HouseholdId, station_id: Option<StationId>) {
        if let Some(station_id) = station_id {
            self.households_by_station
                .entry(station_id)
                .or_default()
                .insert(household_id);
        }
    }

    fn unlink_station(&mut self, household_id: HouseholdId, station_id: Option<StationId>) {
        if let Some(station_id) = station_id {
            if let Some(linked) = self.households_by_station.get_mut(&station_id) {
                linked.remove(&household_id);
            }
        }
    }

    fn remove_household(&mut self, id: HouseholdId) -> Option<Household> {
        let household = self.households.remove(&id)?;
        self.unlink_station(id, household.associated_station_id);
        if let Some(members) = self.households_by_district.get_mut(&household.district_id) {
            members.remove(&id);
        }
        Some(household)
    }

    fn remove_station(&mut self, id: StationId) -> Option<StationRemoval> {
        let station = self.stations.remove(&id)?;
        if let Some(members) = self.stations_by_district.get_mut(&station.district_id) {
            members.remove(&id);
        }

        let linked = self.households_by_station.remove(&id).unwrap_or_default();
        let mut unassigned_households = Vec::with_capacity(linked.len());
        for household_id in linked {
            if let Some(household) = self.households.get_mut(&household_id) {
                household.associated_station_id = None;
                unassigned_households.push(household_id);
            }
        }

        Some(StationRemoval {
            station,
            unassigned_households,
        })
    }

    fn collect<K: Ord + Copy, V: Clone>(
        ids: Option<&BTreeSet<K>>,
        table: &BTreeMap<K, V>,
    ) -> Vec<V> {
        ids.map(|ids| ids.iter().filter_map(|id| table.get(id).cloned()).collect())
            .unwrap_or_default()
    }
}

/// Process-local catalog with secondary indices by state, district and station.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    tables: RwLock<CatalogTables>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CatalogTables>, CatalogError> {
        self.tables
            .read()
            .map_err(|_| CatalogError::Unavailable("catalog lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CatalogTables>, CatalogError> {
        self.tables
            .write()
            .map_err(|_| CatalogError::Unavailable("catalog lock poisoned".to_string()))
    }
}

impl CatalogStore for InMemoryCatalog {
    fn create_state(&self, name: &str) -> Result<State, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "state name must not be empty".to_string(),
            ));
        }

        let mut tables = self.write()?;
        if tables
            .states
            .values()
            .any(|state| state.name.eq_ignore_ascii_case(name))
        {
            return Err(CatalogError::DuplicateState(name.to_string()));
        }

        let id = StateId(advance(&mut tables.sequences.state));
        let state = State {
            id,
            name: name.to_string(),
        };
        tables.states.insert(id, state.clone());
        Ok(state)
    }

    fn create_district(&self, district: NewDistrict) -> Result<District, CatalogError> {
        let name = district.name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "district name must not be empty".to_string(),
            ));
        }

        let mut tables = self.write()?;
        if !tables.states.contains_key(&district.state_id) {
            return Err(CatalogError::missing(
                EntityKind::State,
                district.state_id.0,
            ));
        }

        let id = DistrictId(advance(&mut tables.sequences.district));
        let record = District {
            id,
            name: name.to_string(),
            state_id: district.state_id,
            latitude: district.centroid.map(|c| c.latitude),
            longitude: district.centroid.map(|c| c.longitude),
            solar_flux: district.solar_flux,
        };
        tables.districts.insert(id, record.clone());
        tables
            .districts_by_state
            .entry(district.state_id)
            .or_default()
            .insert(id);
        Ok(record)
    }

    fn create_station(&self, station: NewStation) -> Result<Station, CatalogError> {
        let name = station.name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "station name must not be empty".to_string(),
            ));
        }

        let mut tables = self.write()?;
        tables.require_district(station.district_id)?;

        let id = StationId(advance(&mut tables.sequences.station));
        let record = Station {
            id,
            name: name.to_string(),
            latitude: station.location.latitude,
            longitude: station.location.longitude,
            district_id: station.district_id,
        };
        tables.stations.insert(id, record.clone());
        tables
            .stations_by_district
            .entry(station.district_id)
            .or_default()
            .insert(id);
        Ok(record)
    }

    fn create_household(&self, household: NewHousehold) -> Result<Household, CatalogError> {
        let mut tables = self.write()?;
        tables.require_district(household.district_id)?;
        if let Some(station_id) = household.associated_station_id {
            tables.require_station_in(station_id, household.district_id)?;
        }
        Ok(tables.insert_household(household))
    }

    fn create_matched_household(
        &self,
        placement: HouseholdPlacement,
    ) -> Result<MatchedHousehold, CatalogError> {
        let radius_km = validate_radius(placement.radius_km)
            .map_err(|err| CatalogError::InvalidArgument(err.to_string()))?;

        let mut tables = self.write()?;
        tables.require_district(placement.district_id)?;
        let candidates = CatalogTables::collect(
            tables.stations_by_district.get(&placement.district_id),
            &tables.stations,
        );
        let station = nearest_within(placement.location, &candidates, radius_km);
        if station.is_none() && placement.station_required {
            return Err(CatalogError::NoStationInRange {
                district_id: placement.district_id,
                radius_km,
            });
        }

        let household = tables.insert_household(NewHousehold {
            location: placement.location,
            district_id: placement.district_id,
            associated_station_id: station.as_ref().map(|m| m.station.id),
        });
        Ok(MatchedHousehold { household, station })
    }

    fn state(&self, id: StateId) -> Result<State, CatalogError> {
        self.read()?
            .states
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(EntityKind::State, id.0))
    }

    fn district(&self, id: DistrictId) -> Result<District, CatalogError> {
        self.read()?
            .districts
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(EntityKind::District, id.0))
    }

    fn station(&self, id: StationId) -> Result<Station, CatalogError> {
        self.read()?
            .stations
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(EntityKind::Station, id.0))
    }

    fn household(&self, id: HouseholdId) -> Result<Household, CatalogError> {
        self.read()?
            .households
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(EntityKind::Household, id.0))
    }

    fn states(&self) -> Result<Vec<State>, CatalogError> {
        Ok(self.read()?.states.values().cloned().collect())
    }

    fn districts_in_state(&self, state_id: StateId) -> Result<Vec<District>, CatalogError> {
        let tables = self.read()?;
        if !tables.states.contains_key(&state_id) {
            return Err(CatalogError::not_found(EntityKind::State, state_id.0));
        }
        Ok(CatalogTables::collect(
            tables.districts_by_state.get(&state_id),
            &tables.districts,
        ))
    }

    fn stations_in_district(
        &self,
        district_id: DistrictId,
    ) -> Result<Vec<Station>, CatalogError> {
        let tables = self.read()?;
        if !tables.districts.contains_key(&district_id) {
            return Err(CatalogError::not_found(EntityKind::District, district_id.0));
        }
        Ok(CatalogTables::collect(
            tables.stations_by_district.get(&district_id),
            &tables.stations,
        ))
    }

    fn households_in_district(
        &self,
        district_id: DistrictId,
    ) -> Result<Vec<Household>, CatalogError> {
        let tables = self.read()?;
        if !tables.districts.contains_key(&district_id) {
            return Err(CatalogError::not_found(EntityKind::District, district_id.0));
        }
        Ok(CatalogTables::collect(
            tables.households_by_district.get(&district_id),
            &tables.households,
        ))
    }

    fn households_assigned_to(
        &self,
        station_id: StationId,
    ) -> Result<Vec<Household>, CatalogError> {
        let tables = self.read()?;
        if !tables.stations.contains_key(&station_id) {
            return Err(CatalogError::not_found(EntityKind::Station, station_id.0));
        }
        Ok(CatalogTables::collect(
            tables.households_by_station.get(&station_id),
            &tables.households,
        ))
    }

    fn station_loads(&self) -> Result<Vec<StationLoad>, CatalogError> {
        let tables = self.read()?;
        Ok(tables
            .stations
            .values()
            .map(|station| StationLoad {
                station: station.clone(),
                household_count: tables
                    .households_by_station
                    .get(&station.id)
                    .map_or(0, BTreeSet::len),
            })
            .collect())
    }

    fn household_count(&self) -> Result<usize, CatalogError> {
        Ok(self.read()?.households.len())
    }

    fn assign_station(
        &self,
        household_id: HouseholdId,
        station_id: Option<StationId>,
    ) -> Result<Household, CatalogError> {
        let mut tables = self.write()?;
        let (district_id, previous) = tables
            .households
            .get(&household_id)
            .map(|household| (household.district_id, household.associated_station_id))
            .ok_or_else(|| CatalogError::not_found(EntityKind::Household, household_id.0))?;
        if let Some(station_id) = station_id {
            tables.require_station_in(station_id, district_id)?;
        }

        tables.unlink_station(household_id, previous);
        tables.link_station(household_id, station_id);

        let household = tables
            .households
            .get_mut(&household_id)
            .ok_or_else(|| CatalogError::not_found(EntityKind::Household, household_id.0))?;
        household.associated_station_id = station_id;
        Ok(household.clone())
    }

    fn delete_household(&self, id: HouseholdId) -> Result<Household, CatalogError> {
        self.write()?
            .remove_household(id)
            .ok_or_else(|| CatalogError::not_found(EntityKind::Household, id.0))
    }

    fn delete_station(&self, id: StationId) -> Result<StationRemoval, CatalogError> {
        self.write()?
            .remove_station(id)
            .ok_or_else(|| CatalogError::not_found(EntityKind::Station, id.0))
    }

    fn delete_district(
        &self,
        id: DistrictId,
        cascade: bool,
    ) -> Result<DistrictRemoval, CatalogError> {
        let mut tables = self.write()?;
        if !tables.districts.contains_key(&id) {
            return Err(CatalogError::not_found(EntityKind::District, id.0));
        }

        let station_ids: Vec<StationId> = tables
            .stations_by_district
            .get(&id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        let household_ids: Vec<HouseholdId> = tables
            .households_by_district
            .get(&id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();

        if !cascade && (!station_ids.is_empty() || !household_ids.is_empty()) {
            return Err(CatalogError::DistrictNotEmpty {
                district_id: id,
                stations: station_ids.len(),
                households: household_ids.len(),
            });
        }

        for household_id in &household_ids {
            tables.remove_household(*household_id);
        }
        for station_id in &station_ids {
            tables.remove_station(*station_id);
        }
        tables.stations_by_district.remove(&id);
        tables.households_by_district.remove(&id);

        let district = tables
            .districts
            .remove(&id)
            .ok_or_else(|| CatalogError::not_found(EntityKind::District, id.0))?;
        if let Some(members) = tables.districts_by_state.get_mut(&district.state_id) {
            members.remove(&id);
        }

        Ok(DistrictRemoval {
            district,
            removed_stations: station_ids,
            removed_households: household_ids,
        })
    }
}
