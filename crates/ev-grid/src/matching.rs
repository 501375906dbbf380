//! District-scoped nearest-station search bounded by a radius.
//!
//! A search that finds nothing within the radius is a normal `None` result; only a bad
//! radius or an unknown household is an error.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{CatalogError, CatalogStore, DistrictId, HouseholdId, Station};
use crate::error::FailureKind;
use crate::geo::{distance, Coordinate};

/// Distances closer than this are treated as equal and resolved by station id.
pub const TIE_TOLERANCE_KM: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMatch {
    pub station: Station,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchError {
    #[error("radius must be a positive number of kilometres, got {0}")]
    InvalidRadius(f64),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl MatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MatchError::InvalidRadius(_) => FailureKind::InvalidArgument,
            MatchError::Catalog(err) => err.kind(),
        }
    }
}

pub fn validate_radius(radius_km: f64) -> Result<f64, MatchError> {
    if radius_km.is_finite() && radius_km > 0.0 {
        Ok(radius_km)
    } else {
        Err(MatchError::InvalidRadius(radius_km))
    }
}

/// Closest candidate to `origin` among those within `radius_km`.
pub fn nearest_within<'a, I>(
    origin: Coordinate,
    candidates: I,
    radius_km: f64,
) -> Option<StationMatch>
where
    I: IntoIterator<Item = &'a Station>,
{
    let mut best: Option<(f64, &Station)> = None;

    for station in candidates {
        let d = distance(origin, station.location());
        if d > radius_km {
            continue;
        }
        best = match best {
            None => Some((d, station)),
            Some((best_d, best_station)) => {
                let closer = d < best_d - TIE_TOLERANCE_KM;
                let tied = (d - best_d).abs() <= TIE_TOLERANCE_KM;
                if closer || (tied && station.id < best_station.id) {
                    Some((d, station))
                } else {
                    Some((best_d, best_station))
                }
            }
        };
    }

    best.map(|(distance_km, station)| StationMatch {
        station: station.clone(),
        distance_km,
    })
}

pub struct ProximityMatcher<C> {
    catalog: Arc<C>,
}

impl<C> Clone for ProximityMatcher<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<C> ProximityMatcher<C>
where
    C: CatalogStore + 'static,
{
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    pub fn find_nearest_station(
        &self,
        household_id: HouseholdId,
        radius_km: f64,
    ) -> Result<Option<StationMatch>, MatchError> {
        let radius_km = validate_radius(radius_km)?;
        let household = self.catalog.household(household_id)?;
        self.nearest_to(household.location(), household.district_id, radius_km)
    }

    pub fn nearest_to(
        &self,
        origin: Coordinate,
        district_id: DistrictId,
        radius_km: f64,
    ) -> Result<Option<StationMatch>, MatchError> {
        let radius_km = validate_radius(radius_km)?;
        let candidates = self.catalog.stations_in_district(district_id)?;
        let found = nearest_within(origin, &candidates, radius_km);

        debug!(
            %district_id,
            candidates = candidates.len(),
            radius_km,
            station = ?found.as_ref().map(|m| m.station.id),
            distance_km = ?found.as_ref().map(|m| m.distance_km),
            "nearest station search"
        );

        Ok(found)
    }
}
