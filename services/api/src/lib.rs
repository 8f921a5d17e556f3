mod cli;
mod demo;
mod infra;
mod routes;
mod server;
mod terminal;
mod verifier;

use esg_maturity::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
