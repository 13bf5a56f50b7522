// main.rs
// Axum server wiring: loads configuration, connects MongoDB and serves the
// scheduler-facing triggers.
//
// Endpoints:
// - GET  /ventas/actualizar                    -> rebuilds the current year's sales buckets
// - GET  /ventas/actualizarInstitutionMesAnio  -> stores the current period on the institution
// - GET  /documents/saveNewDocuments           -> ingests today's Contifico documents
// - POST /documents/ingest                     -> ingests documents posted as JSON
// - PUT  /documents/updateDocumentCity         -> sets a document's destination
// - GET  /documents/updateClientStatus         -> recomputes client new/frequent flags
// - GET  /documents/updateClientMonthTotal     -> zeroes monthly client counters

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use vanu::{config::Config, routes, state};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vanu=info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let addr = config.bind_addr;
    let state = Arc::new(
        state::init_state_with(config)
            .await
            .context("failed to initialize MongoDB state")?,
    );

    let app = routes::router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
