mod cli;
mod infra;
mod proof;
mod routes;
mod server;

use identity_proofing::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
