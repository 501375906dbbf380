use crate::infra::Services;
use clap::Args;
use ev_grid::catalog::DistrictId;
use ev_grid::config::{AppConfig, MatchingConfig};
use ev_grid::error::AppError;
use ev_grid::queries::StationLoadSummary;
use ev_grid::seed;
use ev_grid::workflows::applications::ApplicationSubmission;
use std::path::PathBuf;

const DEMO_DISTRICTS: &str = "\
state,district,latitude,longitude,solar_flux
Kerala,Demo District,10.0,76.0,5.4
";

const DEMO_STATIONS: &str = "\
state,district,name,latitude,longitude
Kerala,Demo District,Central Station,10.0,76.0
Kerala,Demo District,Hill Station,10.5,76.5
";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Matching radius in kilometres for the approval step (defaults to 10).
    #[arg(long)]
    pub(crate) radius: Option<f64>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogSummaryArgs {
    /// Directory containing districts.csv and stations.csv (defaults to bundled data).
    #[arg(long)]
    pub(crate) seed_dir: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let matching = MatchingConfig::default();
    let radius_km = args.radius.unwrap_or(matching.default_radius_km);
    let services = Services::in_memory(matching);
    seed::seed_from_readers(
        services.catalog.as_ref(),
        DEMO_DISTRICTS.as_bytes(),
        DEMO_STATIONS.as_bytes(),
    )?;
    // First district created in a fresh catalog.
    let district = DistrictId(1);

    println!("EV grid demo");
    println!("  District centroid (10.0000, 76.0000); stations at (10.0, 76.0) and (10.5, 76.5)");

    let application = match services
        .applications
        .submit(ApplicationSubmission::at(district, 10.01, 76.01))
    {
        Ok(application) => application,
        Err(err) => {
            println!("  Submission rejected: {}", err);
            return Ok(());
        }
    };
    println!(
        "  Submitted {} at ({:.4}, {:.4}) -> {}",
        application.id, application.latitude, application.longitude, application.status
    );

    match services.applications.approve(application.id, radius_km) {
        Ok(household) => match household.associated_station_id {
            Some(station) => println!(
                "  Approved within {radius_km} km: household {} assigned to {}",
                household.id, station
            ),
            None => println!(
                "  Approved within {radius_km} km: household {} has no station in range",
                household.id
            ),
        },
        Err(err) => println!("  Approval failed: {}", err),
    }

    match services.applications.approve(application.id, radius_km) {
        Ok(_) => println!("  Second approval unexpectedly succeeded"),
        Err(err) => println!("  Second approval refused ({}): {}", err.kind().label(), err),
    }

    let queries = services.catalog_service.queries();
    if let Ok(households) = queries.list_households(district) {
        for household in households {
            match queries.nearest_station(household.id, Some(0.5)) {
                Ok(view) if view.station.is_none() => {
                    println!("  Nearest station to {} within 0.5 km: none", household.id)
                }
                Ok(view) => println!(
                    "  Nearest station to {} within 0.5 km: {:?} at {:.3} km",
                    household.id,
                    view.station.map(|station| station.name),
                    view.distance_km.unwrap_or_default()
                ),
                Err(err) => println!("  Nearest station lookup failed: {}", err),
            }
        }
    }

    match queries.station_load_summary() {
        Ok(summary) => render_summary(&summary),
        Err(err) => println!("  Summary unavailable: {}", err),
    }

    Ok(())
}

pub(crate) fn run_catalog_summary(args: CatalogSummaryArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let seed_dir = args.seed_dir.or(config.catalog.seed_dir);

    let services = Services::in_memory(config.matching);
    let report = services.seed(seed_dir.as_deref())?;
    println!(
        "Catalog: {} states, {} districts, {} stations",
        report.states, report.districts, report.stations
    );

    match services.catalog_service.queries().station_load_summary() {
        Ok(summary) => render_summary(&summary),
        Err(err) => println!("Summary unavailable: {}", err),
    }
    Ok(())
}

fn render_summary(summary: &StationLoadSummary) {
    println!(
        "\nStation load ({} stations, {} households, {} unassigned)",
        summary.total_stations, summary.total_households, summary.unassigned_households
    );
    for load in &summary.stations {
        println!(
            "  {:<32} {:>12} {:>4} households",
            load.station.name,
            load.station.district_id.to_string(),
            load.household_count
        );
    }
}
