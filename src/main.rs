mod balance;
mod config;
mod constraints;
mod data;
mod error;
mod format;
mod grid;
mod model;
mod sample;
mod server;
mod solver;

use crate::error::ServerError;
use log::info;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let settings = config::Settings::from_env()?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log_filter.as_str()),
    )
    .init();

    info!(
        "Starting timetable solver (node limit {}, timeout {} ms)",
        settings.node_limit, settings.solve_timeout_ms
    );
    server::run_server(settings).await
}
