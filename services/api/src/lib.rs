mod cli;
mod export;
mod infra;
mod routes;
mod server;

use stress_check::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
