use crate::demo::{run_catalog_summary, run_demo, CatalogSummaryArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use ev_grid::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "EV Grid",
    about = "Run the EV charging station matching and household approval service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect the station catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Run an end-to-end demo: seed a district, submit and approve an application
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Print households per station for a seeded catalog
    Summary(CatalogSummaryArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Directory containing districts.csv and stations.csv
    #[arg(long)]
    pub(crate) seed_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Catalog {
            command: CatalogCommand::Summary(args),
        } => run_catalog_summary(args),
        Command::Demo(args) => run_demo(args),
    }
}
