// routes/ventas.rs
// GET /ventas/actualizar[?anio=YYYY]            -> rebuilds the sales buckets of a year
// GET /ventas/actualizarInstitutionMesAnio      -> stores the current period on the institution

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    error::AppError,
    periods,
    state::{AppState, update_institution_period},
    ventas::refresh_sales,
};

use super::Mensaje;

#[derive(Debug, Default, Deserialize)]
pub struct ActualizarQuery {
    anio: Option<String>,
}

fn parse_anio(raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|anio| (2000..=9999).contains(anio))
        .ok_or_else(|| AppError::BadRequest(format!("año inválido: {raw}")))
}

pub async fn actualizar_ventas(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActualizarQuery>,
) -> Result<Json<Mensaje>, AppError> {
    let anio = match query.anio.as_deref() {
        Some(raw) => parse_anio(raw)?,
        None => periods::local_year_month(state.config.timezone, Utc::now()).0,
    };

    let _guard = state
        .ventas_lock
        .try_lock()
        .map_err(|_| AppError::RunInProgress("ventas"))?;

    let outcome = refresh_sales(&state, anio).await?;
    Ok(Json(Mensaje::new(outcome.message())))
}

pub async fn actualizar_institucion(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Mensaje>, AppError> {
    let (anio, mes) = periods::local_year_month(state.config.timezone, Utc::now());
    if !update_institution_period(&state, mes as i32, anio).await? {
        return Err(AppError::NotFound("No existe registro de institución".to_string()));
    }
    tracing::info!(mes, anio, "institution period updated");
    Ok(Json(Mensaje::new(
        "Se actualizo correctamente el mes y año de la institución",
    )))
}
