mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use ev_grid::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
