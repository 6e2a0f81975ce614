mod config;
mod dataset;
mod db;
mod error;
mod loader;
mod views;
mod web_service;

use web_service::run_web_service;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run_web_service().await
}
