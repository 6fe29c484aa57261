// SPDX-License-Identifier: PMPL-1.0-or-later
//! Atoms API server binary
//!
//! Opens the configured table once and serves every view over it.

use atoms_api::{ApiConfig, AppState};
use atoms_store::{open_table, StoreConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let store_config = StoreConfig::from_env()?;
    let api_config = ApiConfig::from_env()?;

    tracing::info!(
        backend = ?store_config.backend,
        table = %store_config.table_name,
        "Starting atoms API server on {}:{}",
        api_config.host,
        api_config.port
    );

    let table = open_table(&store_config)?;
    atoms_api::serve(api_config, AppState::new(table)).await?;

    Ok(())
}
