//! States, districts, stations and households with referential integrity.

pub mod domain;
pub mod router;
pub mod service;
pub mod store;
#[cfg(test)]
pub(crate) mod testing;

pub use domain::{
    District, DistrictId, DistrictMembers, EntityKind, Household, HouseholdId, NewDistrict,
    NewHousehold, NewStation, State, StateId, Station, StationId,
};
pub use router::catalog_router;
pub use service::{CatalogService, CatalogServiceError};
pub use store::{
    CatalogError, CatalogStore, DistrictRemoval, HouseholdPlacement, InMemoryCatalog,
    MatchedHousehold, StationLoad, StationRemoval,
};
