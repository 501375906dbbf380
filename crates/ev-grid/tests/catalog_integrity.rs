//! Referential integrity of the catalog as seen through the public store and matcher.

use std::sync::Arc;

use ev_grid::catalog::{
    CatalogError, CatalogStore, District, EntityKind, InMemoryCatalog, NewDistrict, NewHousehold,
    NewStation, StateId,
};
use ev_grid::geo::Coordinate;
use ev_grid::matching::ProximityMatcher;
use ev_grid::seed;
use ev_grid::FailureKind;

fn point(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate::new(latitude, longitude).expect("valid coordinate")
}

fn district(catalog: &InMemoryCatalog, state_id: StateId, name: &str) -> District {
    catalog
        .create_district(NewDistrict {
            name: name.to_string(),
            state_id,
            centroid: Some(point(10.0, 76.0)),
            solar_flux: None,
        })
        .expect("district")
}

#[test]
fn children_require_existing_parents() {
    let catalog = InMemoryCatalog::new();

    let err = catalog
        .create_district(NewDistrict {
            name: "Orphan".to_string(),
            state_id: StateId(9),
            centroid: None,
            solar_flux: None,
        })
        .expect_err("state missing");
    assert_eq!(err.kind(), FailureKind::ReferenceError);

    let state = catalog.create_state("Kerala").expect("state");
    let home = district(&catalog, state.id, "Ernakulam");
    let away = district(&catalog, state.id, "Idukki");
    let station = catalog
        .create_station(NewStation {
            name: "Away".to_string(),
            location: point(10.0, 76.0),
            district_id: away.id,
        })
        .expect("station");

    let err = catalog
        .create_household(NewHousehold {
            location: point(10.0, 76.0),
            district_id: home.id,
            associated_station_id: Some(station.id),
        })
        .expect_err("station belongs to another district");
    assert_eq!(err.kind(), FailureKind::InvalidArgument);
}

#[test]
fn district_with_members_needs_cascade() {
    let catalog = InMemoryCatalog::new();
    let state = catalog.create_state("Kerala").expect("state");
    let target = district(&catalog, state.id, "Ernakulam");
    let station = catalog
        .create_station(NewStation {
            name: "Central".to_string(),
            location: point(10.0, 76.0),
            district_id: target.id,
        })
        .expect("station");
    let household = catalog
        .create_household(NewHousehold {
            location: point(10.01, 76.01),
            district_id: target.id,
            associated_station_id: Some(station.id),
        })
        .expect("household");

    match catalog.delete_district(target.id, false) {
        Err(CatalogError::DistrictNotEmpty {
            stations,
            households,
            ..
        }) => {
            assert_eq!(stations, 1);
            assert_eq!(households, 1);
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    assert!(catalog.district(target.id).is_ok());

    let removal = catalog.delete_district(target.id, true).expect("cascade");
    assert_eq!(removal.removed_stations, vec![station.id]);
    assert_eq!(removal.removed_households, vec![household.id]);

    assert!(matches!(
        catalog.household(household.id),
        Err(CatalogError::NotFound {
            kind: EntityKind::Household,
            ..
        })
    ));
    assert_eq!(catalog.station_loads().expect("loads").len(), 0);
}

#[test]
fn matcher_never_crosses_district_lines() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let state = catalog.create_state("Kerala").expect("state");
    let home = district(&catalog, state.id, "Ernakulam");
    let away = district(&catalog, state.id, "Idukki");
    catalog
        .create_station(NewStation {
            name: "Next door".to_string(),
            location: point(10.0, 76.0),
            district_id: away.id,
        })
        .expect("station");
    let household = catalog
        .create_household(NewHousehold {
            location: point(10.0, 76.0),
            district_id: home.id,
            associated_station_id: None,
        })
        .expect("household");

    let matcher = ProximityMatcher::new(catalog.clone());
    let found = matcher
        .find_nearest_station(household.id, 50.0)
        .expect("search runs");
    assert!(found.is_none());
}

#[test]
fn bundled_catalog_matches_households_to_seeded_stations() {
    let catalog = Arc::new(InMemoryCatalog::new());
    seed::seed_bundled(catalog.as_ref()).expect("bundled seed");

    let matcher = ProximityMatcher::new(catalog.clone());
    for state in catalog.states().expect("states") {
        for district in catalog.districts_in_state(state.id).expect("districts") {
            let centroid = district.centroid().expect("bundled centroids");
            let found = matcher
                .nearest_to(centroid, district.id, 10.0)
                .expect("search runs")
                .expect("a seeded station near every centroid");
            assert_eq!(found.station.district_id, district.id);
            assert!(found.distance_km < 5.0);
        }
    }
}
