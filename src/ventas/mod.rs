// ventas: yearly sales aggregation into monthly, yearly and consolidated
// buckets.
//
// The consolidated `(0, 0)` bucket is rebuilt from the requested year only,
// so it reflects the last aggregated year rather than an all-time total.
// In accumulated mode its `clientesNuevos` still comes from the all-time
// `(0, 0)` counter, so that one field is not scoped to the year.

use anyhow::{Context, Result};
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;

use crate::{
    config::ClientesNuevosMode,
    state::{
        AppState, begin_batch, city_name, count_new_clients, documents_in_year, finish_batch,
        new_client_counter, upsert_bucket_in,
    },
};

mod aggregate;
mod labels;

pub use aggregate::*;
pub use labels::mes_label;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SalesRunOutcome {
    NoDocuments { anio: i32 },
    Updated { anio: i32, documentos: usize, buckets: usize },
}

impl SalesRunOutcome {
    pub fn message(&self) -> String {
        match self {
            SalesRunOutcome::NoDocuments { .. } => {
                "No hay documentos para actualizar las ventas".to_string()
            }
            SalesRunOutcome::Updated { .. } => "Ventas actualizadas exitosamente".to_string(),
        }
    }
}

/// City names resolved during one run, one read per distinct city.
#[derive(Default)]
struct CityNames {
    names: HashMap<ObjectId, String>,
}

impl CityNames {
    async fn resolve(&mut self, state: &AppState, id: &ObjectId) -> String {
        if let Some(name) = self.names.get(id) {
            return name.clone();
        }
        match city_name(state, id).await {
            Ok(found) => {
                let name = found.unwrap_or_else(|| DESCONOCIDO.to_string());
                self.names.insert(*id, name.clone());
                name
            }
            Err(err) => {
                tracing::warn!(ciudad = %id, error = %err, "city lookup failed");
                DESCONOCIDO.to_string()
            }
        }
    }
}

/// Recomputes every bucket of `anio` from the stored documents and writes
/// them back. Safe to re-run: buckets are replaced, never incremented.
pub async fn refresh_sales(state: &AppState, anio: i32) -> Result<SalesRunOutcome> {
    let documentos = documents_in_year(state, anio)
        .await
        .with_context(|| format!("loading documents of {anio}"))?;

    if documentos.is_empty() {
        tracing::info!(anio, "no documents to aggregate");
        return Ok(SalesRunOutcome::NoDocuments { anio });
    }

    let mut aggregation = Aggregation::new(&state.config.canal_excluido, state.config.timezone);
    let mut cities = CityNames::default();
    for documento in &documentos {
        let destino = match &documento.id_ciudad_destino {
            Some(id) => Some(cities.resolve(state, id).await),
            None => None,
        };
        aggregation.add(documento, destino.as_deref());
    }

    let snapshot = match state.config.clientes_nuevos {
        ClientesNuevosMode::Snapshot => Some(count_new_clients(state).await? as i64),
        ClientesNuevosMode::Accumulated => None,
    };

    let mut ventas = Vec::with_capacity(aggregation.len());
    for (key, totals) in aggregation.into_buckets() {
        let clientes_nuevos = match snapshot {
            Some(count) => count,
            None => new_client_counter(state, key).await?,
        };
        ventas.push(totals.into_venta(key, clientes_nuevos));
    }

    // All buckets of the run are written as one batch.
    let mut session = begin_batch(state).await?;
    let written: Result<usize> = async {
        let count = ventas.len();
        for venta in ventas {
            let (mes, anio) = (venta.mes, venta.anio);
            upsert_bucket_in(state, venta, session.as_mut())
                .await
                .with_context(|| format!("saving bucket {mes}/{anio}"))?;
        }
        Ok(count)
    }
    .await;
    let buckets = finish_batch(session, written).await?;

    tracing::info!(anio, documentos = documentos.len(), buckets, "sales buckets updated");
    Ok(SalesRunOutcome::Updated {
        anio,
        documentos: documentos.len(),
        buckets,
    })
}
