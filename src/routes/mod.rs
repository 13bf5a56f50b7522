// routes/mod.rs
// Router wiring and shared response body.

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

pub mod documents;
pub mod ventas;

pub use documents::{
    client_month_total, client_status, ingest_documents, save_new_documents, update_city,
};
pub use ventas::{actualizar_institucion, actualizar_ventas};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mensaje {
    pub message: String,
}

impl Mensaje {
    pub fn new(message: impl Into<String>) -> Self {
        Mensaje {
            message: message.into(),
        }
    }
}

pub async fn health() -> Json<Mensaje> {
    Json(Mensaje::new("ok"))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ventas/actualizar", get(actualizar_ventas))
        .route(
            "/ventas/actualizarInstitutionMesAnio",
            get(actualizar_institucion),
        )
        .route("/documents/saveNewDocuments", get(save_new_documents))
        .route("/documents/ingest", post(ingest_documents))
        .route("/documents/updateDocumentCity", put(update_city))
        .route("/documents/updateClientStatus", get(client_status))
        .route("/documents/updateClientMonthTotal", get(client_month_total))
        .with_state(state)
}
