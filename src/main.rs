mod charts;
mod color;
mod config;
mod data;
mod state;
mod web;

use anyhow::{Context, Result};
use log::{info, warn};

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    // No dataset, no server: a bad file stops the process before it binds.
    let dataset = data::loader::load_csv(&config.data_path)
        .with_context(|| format!("loading student data from {}", config.data_path.display()))?;
    info!(
        "loaded {} students ({} columns) from {}",
        dataset.len(),
        dataset.column_names().len(),
        config.data_path.display()
    );
    if dataset.is_empty() {
        warn!("student table is empty; every chart will render without data");
    }

    let app = web::router(AppState::new(dataset));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("serving dashboard on http://{addr}");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
