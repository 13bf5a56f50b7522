// routes/documents.rs
// GET  /documents/saveNewDocuments          -> refreshes the city/branch catalog, then ingests today's Contifico documents
// POST /documents/ingest                    -> ingests a JSON array of Contifico documents
// PUT  /documents/updateDocumentCity        -> sets the destination of a document
// GET  /documents/updateClientStatus        -> recomputes new/frequent flags
// GET  /documents/updateClientMonthTotal    -> zeroes the monthly client counters

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;

use crate::{
    catalog::refresh_catalog,
    clients::{reset_month_totals, update_client_status},
    contifico::{ContificoClient, ContificoDocument},
    documents::{UpdateCityRequest, ingest, update_document_city},
    error::AppError,
    state::AppState,
};

use super::Mensaje;

pub async fn save_new_documents(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<Mensaje>), AppError> {
    let client = ContificoClient::from_config(&state.config).ok_or_else(|| {
        AppError::BadRequest("Contifico no está configurado".to_string())
    })?;

    let catalogo = refresh_catalog(&state).await?;
    tracing::debug!(?catalogo, "catalog refreshed");

    let now = Utc::now();
    let today = now.with_timezone(&state.config.timezone).date_naive();
    let raw_docs = client
        .fetch_documents(today)
        .await
        .map_err(|source| AppError::Upstream {
            service: "Contifico",
            source,
        })?;

    if raw_docs.is_empty() {
        tracing::info!("no documents to add");
    }
    let report = ingest(&state, &raw_docs, now).await?;
    Ok((StatusCode::CREATED, Json(Mensaje::new(report.message()))))
}

pub async fn ingest_documents(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<ContificoDocument>>, JsonRejection>,
) -> Result<(StatusCode, Json<Mensaje>), AppError> {
    let Json(raw_docs) = payload?;
    let report = ingest(&state, &raw_docs, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(Mensaje::new(report.message()))))
}

pub async fn update_city(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateCityRequest>, JsonRejection>,
) -> Result<Json<Mensaje>, AppError> {
    let Json(body) = payload?;
    let id = update_document_city(&state, &body).await?;
    Ok(Json(Mensaje::new(format!(
        "Actualización de documento {id} éxitosa"
    ))))
}

pub async fn client_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Mensaje>, AppError> {
    let _guard = state
        .clientes_lock
        .try_lock()
        .map_err(|_| AppError::RunInProgress("clientes"))?;
    let report = update_client_status(&state, Utc::now()).await?;
    Ok(Json(Mensaje::new(report.message())))
}

pub async fn client_month_total(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Mensaje>, AppError> {
    let _guard = state
        .clientes_lock
        .try_lock()
        .map_err(|_| AppError::RunInProgress("clientes"))?;
    let modified = reset_month_totals(&state).await?;
    Ok(Json(Mensaje::new(format!(
        "Totales mensuales reiniciados para {modified} clientes"
    ))))
}
