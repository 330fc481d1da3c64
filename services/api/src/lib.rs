mod cli;
mod evaluate;
mod infra;
mod routes;
mod server;

use claim_scan::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
