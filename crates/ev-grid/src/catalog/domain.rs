use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

entity_id!(StateId, "state");
entity_id!(DistrictId, "district");
entity_id!(
    /// Ordering of station ids is the matcher's tie-break.
    StationId,
    "station"
);
entity_id!(HouseholdId, "household");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub id: StateId,
    pub name: String,
}

/// Administrative region owning stations and households; the scope of matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: DistrictId,
    pub name: String,
    pub state_id: StateId,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Annual mean irradiance in kWh/m²/day. Informational only.
    pub solar_flux: Option<f64>,
}

impl District {
    pub fn centroid(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub district_id: DistrictId,
}

impl Station {
    pub fn location(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub latitude: f64,
    pub longitude: f64,
    pub district_id: DistrictId,
    /// Lookup-only link; resolve through the store and treat a miss as unassigned.
    pub associated_station_id: Option<StationId>,
}

impl Household {
    pub fn location(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDistrict {
    pub name: String,
    pub state_id: StateId,
    pub centroid: Option<Coordinate>,
    pub solar_flux: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStation {
    pub name: String,
    pub location: Coordinate,
    pub district_id: DistrictId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewHousehold {
    pub location: Coordinate,
    pub district_id: DistrictId,
    pub associated_station_id: Option<StationId>,
}

/// Entity families that hang off a district.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    State,
    District,
    Station,
    Household,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            EntityKind::State => "state",
            EntityKind::District => "district",
            EntityKind::Station => "station",
            EntityKind::Household => "household",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of `list_by_district`.
#[derive(Debug, Clone, PartialEq)]
pub enum DistrictMembers {
    Stations(Vec<Station>),
    Households(Vec<Household>),
}
