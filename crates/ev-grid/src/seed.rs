//! CSV bootstrap for the catalog.
//!
//! `districts.csv` carries `state,district,latitude,longitude,solar_flux` and
//! `stations.csv` carries `state,district,name,latitude,longitude`. States are created
//! in first-seen order; rows that name an existing state, district or station (by name
//! within its district) reuse it.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{
    CatalogError, CatalogStore, DistrictId, NewDistrict, NewStation, StateId,
};
use crate::error::FailureKind;
use crate::geo::Coordinate;

pub const DISTRICTS_FILE: &str = "districts.csv";
pub const STATIONS_FILE: &str = "stations.csv";

const BUNDLED_DISTRICTS: &str = include_str!("../seed/districts.csv");
const BUNDLED_STATIONS: &str = include_str!("../seed/stations.csv");

/// Counts of entities created by one seeding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub states: usize,
    pub districts: usize,
    pub stations: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed seed row: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("station `{station}` names unknown district `{district}` in `{state}`")]
    UnknownDistrict {
        state: String,
        district: String,
        station: String,
    },
}

impl SeedError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SeedError::Io { .. } => FailureKind::Unavailable,
            SeedError::Csv(_) => FailureKind::InvalidArgument,
            SeedError::Catalog(err) => err.kind(),
            SeedError::UnknownDistrict { .. } => FailureKind::ReferenceError,
        }
    }
}

/// Load `districts.csv` and `stations.csv` from `dir` into `catalog`.
pub fn seed_from_dir<C>(catalog: &C, dir: &Path) -> Result<SeedReport, SeedError>
where
    C: CatalogStore + ?Sized,
{
    let districts = open(dir.join(DISTRICTS_FILE))?;
    let stations = open(dir.join(STATIONS_FILE))?;
    let report = seed_from_readers(catalog, districts, stations)?;
    info!(
        dir = %dir.display(),
        states = report.states,
        districts = report.districts,
        stations = report.stations,
        "catalog seeded"
    );
    Ok(report)
}

pub fn seed_from_readers<C, D, S>(
    catalog: &C,
    districts: D,
    stations: S,
) -> Result<SeedReport, SeedError>
where
    C: CatalogStore + ?Sized,
    D: Read,
    S: Read,
{
    let mut index = CatalogIndex::load(catalog)?;
    let mut report = SeedReport::default();

    for row in reader(districts).deserialize::<DistrictRow>() {
        let row = row?;
        let (state_id, created) = index.state(catalog, &row.state)?;
        if created {
            report.states += 1;
        }

        let key = (row.state.clone(), row.district.clone());
        if index.districts.contains_key(&key) {
            continue;
        }

        let district = catalog.create_district(NewDistrict {
            name: row.district.clone(),
            state_id,
            centroid: row.centroid()?,
            solar_flux: row.solar_flux,
        })?;
        index.districts.insert(key, district.id);
        report.districts += 1;
    }

    for row in reader(stations).deserialize::<StationRow>() {
        let row = row?;
        let district_id = index
            .districts
            .get(&(row.state.clone(), row.district.clone()))
            .copied()
            .ok_or_else(|| SeedError::UnknownDistrict {
                state: row.state.clone(),
                district: row.district.clone(),
                station: row.name.clone(),
            })?;

        let key = (district_id, row.name.trim().to_string());
        if index.stations.contains(&key) {
            continue;
        }

        catalog.create_station(NewStation {
            location: Coordinate::new(row.latitude, row.longitude)
                .map_err(CatalogError::from)?,
            name: row.name,
            district_id,
        })?;
        index.stations.insert(key);
        report.stations += 1;
    }

    Ok(report)
}

/// Load the Kerala, Karnataka and Maharashtra seed set compiled into the crate.
pub fn seed_bundled<C>(catalog: &C) -> Result<SeedReport, SeedError>
where
    C: CatalogStore + ?Sized,
{
    let report = seed_from_readers(
        catalog,
        BUNDLED_DISTRICTS.as_bytes(),
        BUNDLED_STATIONS.as_bytes(),
    )?;
    info!(
        states = report.states,
        districts = report.districts,
        stations = report.stations,
        "catalog seeded from bundled data"
    );
    Ok(report)
}

fn open(path: PathBuf) -> Result<File, SeedError> {
    File::open(&path).map_err(|source| SeedError::Io { path, source })
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source)
}

/// Name lookups over what the catalog already holds.
struct CatalogIndex {
    states: HashMap<String, StateId>,
    districts: HashMap<(String, String), DistrictId>,
    stations: HashSet<(DistrictId, String)>,
}

impl CatalogIndex {
    fn load<C>(catalog: &C) -> Result<Self, CatalogError>
    where
        C: CatalogStore + ?Sized,
    {
        let mut states = HashMap::new();
        let mut districts = HashMap::new();
        let mut stations = HashSet::new();
        for state in catalog.states()? {
            for district in catalog.districts_in_state(state.id)? {
                for station in catalog.stations_in_district(district.id)? {
                    stations.insert((district.id, station.name));
                }
                districts.insert((state.name.clone(), district.name), district.id);
            }
            states.insert(state.name, state.id);
        }
        Ok(Self {
            states,
            districts,
            stations,
        })
    }

    fn state<C>(&mut self, catalog: &C, name: &str) -> Result<(StateId, bool), CatalogError>
    where
        C: CatalogStore + ?Sized,
    {
        if let Some(id) = self.states.get(name) {
            return Ok((*id, false));
        }
        let state = catalog.create_state(name)?;
        self.states.insert(state.name, state.id);
        Ok((state.id, true))
    }
}

#[derive(Debug, Deserialize)]
struct DistrictRow {
    state: String,
    district: String,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    solar_flux: Option<f64>,
}

impl DistrictRow {
    fn centroid(&self) -> Result<Option<Coordinate>, CatalogError> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                Ok(Some(Coordinate::new(latitude, longitude)?))
            }
            (None, None) => Ok(None),
            _ => Err(CatalogError::InvalidArgument(format!(
                "district `{}` has half a centroid",
                self.district
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StationRow {
    state: String,
    district: String,
    name: String,
    latitude: f64,
    longitude: f64,
}
