//! Run the HTTP API.

use super::{load_config, open_database};
use crate::server::{self, state::AppState};
use anyhow::Result;
use colored::Colorize;
use scholar_ai::RetrievalQa;
use std::path::Path;
use tracing::{info, warn};

pub fn run(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let missing = config.missing_credentials();
    if !missing.is_empty() {
        warn!("Missing credentials: {}", missing.join(", "));
    }

    let db = open_database(&config)?;

    let qa = match RetrievalQa::from_config(&config) {
        Ok(qa) => Some(qa),
        Err(e) => {
            warn!("Chat will answer without retrieval: {}", e);
            None
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    println!(
        "{} {}",
        "Scholar API listening on".green().bold(),
        format!("http://{}", addr).cyan()
    );
    info!("Upload directory: {}", config.server.upload_path().display());

    let state = AppState::new(config, db, qa);
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server::serve(state, &addr))
}
