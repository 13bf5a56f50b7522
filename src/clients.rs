// clients.rs
// Client reconciliation: new/frequent flags, monthly counter reset and the
// per-order counters fed by ingestion.

use anyhow::{Context, Result};
use chrono::{DateTime as ChronoDateTime, Months, Utc};
use mongodb::{
    ClientSession,
    bson::{DateTime, Document, doc, oid::ObjectId},
};
use std::collections::HashMap;

use crate::{
    models::{Cliente, Documento},
    periods,
    state::{
        AppState, apply_status_changes, bump_new_client_counters_in, documents_in_range,
        increment_client_counters_in, list_clients, reset_client_month_totals,
        revert_client_counters,
    },
    ventas::BucketKey,
};

/// Flag updates for one client. `nuevo` is only ever set to false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStatusChange {
    pub id: ObjectId,
    pub nuevo: Option<bool>,
    pub frecuente: Option<bool>,
}

impl ClientStatusChange {
    pub fn to_update(&self) -> Document {
        let mut set = Document::new();
        if let Some(nuevo) = self.nuevo {
            set.insert("nuevo", nuevo);
        }
        if let Some(frecuente) = self.frecuente {
            set.insert("frecuente", frecuente);
        }
        doc! { "$set": set }
    }
}

/// A client stops being new one calendar month after creation. Clients
/// without a creation date are treated as past the window.
pub fn new_window_expired(fecha_creacion: Option<DateTime>, now: ChronoDateTime<Utc>) -> bool {
    let Some(created) = fecha_creacion else {
        return true;
    };
    match now.checked_sub_months(Months::new(1)) {
        Some(cutoff) => created.to_chrono() < cutoff,
        None => false,
    }
}

/// Orders per client among the given documents.
pub fn count_orders_by_client(documentos: &[Documento]) -> HashMap<ObjectId, u32> {
    let mut counts = HashMap::new();
    for cliente in documentos.iter().filter_map(|d| d.id_cliente) {
        *counts.entry(cliente).or_insert(0) += 1;
    }
    counts
}

/// Changes needed so that `nuevo` and `frecuente` match the current state.
/// Clients already in the right state produce no change.
pub fn plan_status_changes(
    clientes: &[Cliente],
    pedidos_del_mes: &HashMap<ObjectId, u32>,
    now: ChronoDateTime<Utc>,
    min_pedidos: u32,
) -> Vec<ClientStatusChange> {
    clientes
        .iter()
        .filter_map(|cliente| {
            let id = cliente.id?;
            let nuevo = (cliente.nuevo && new_window_expired(cliente.fecha_creacion, now))
                .then_some(false);
            let frecuente_ahora = pedidos_del_mes.get(&id).copied().unwrap_or(0) >= min_pedidos;
            let frecuente = (frecuente_ahora != cliente.frecuente).then_some(frecuente_ahora);

            if nuevo.is_none() && frecuente.is_none() {
                None
            } else {
                Some(ClientStatusChange { id, nuevo, frecuente })
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRunReport {
    pub revisados: usize,
    pub nuevos_vencidos: usize,
    pub frecuentes_activados: usize,
    pub frecuentes_retirados: usize,
}

impl StatusRunReport {
    pub fn message(&self) -> String {
        format!(
            "Estados de clientes actualizados: {} revisados, {} dejan de ser nuevos, {} pasan a frecuentes, {} dejan de ser frecuentes",
            self.revisados, self.nuevos_vencidos, self.frecuentes_activados, self.frecuentes_retirados
        )
    }
}

/// Recomputes `nuevo` and `frecuente` for every client and applies all
/// changes as one batch.
pub async fn update_client_status(state: &AppState, now: ChronoDateTime<Utc>) -> Result<StatusRunReport> {
    let tz = state.config.timezone;
    let (anio, mes) = periods::local_year_month(tz, now);
    let (from, to) = periods::month_bounds(tz, anio, mes)
        .with_context(|| format!("no local midnight for {mes}/{anio}"))?;

    let clientes = list_clients(state).await?;
    let documentos = documents_in_range(state, from, to).await?;
    let pedidos = count_orders_by_client(&documentos);

    let changes = plan_status_changes(&clientes, &pedidos, now, state.config.frecuente_min_pedidos);
    apply_status_changes(state, &changes).await?;

    let report = StatusRunReport {
        revisados: clientes.len(),
        nuevos_vencidos: changes.iter().filter(|c| c.nuevo == Some(false)).count(),
        frecuentes_activados: changes.iter().filter(|c| c.frecuente == Some(true)).count(),
        frecuentes_retirados: changes.iter().filter(|c| c.frecuente == Some(false)).count(),
    };
    tracing::info!(
        revisados = report.revisados,
        cambios = changes.len(),
        "client status pass finished"
    );
    Ok(report)
}

/// Zeroes `totalMes` and `totalMoneyMes`; meant for the first day of a month.
pub async fn reset_month_totals(state: &AppState) -> Result<u64> {
    let modified = reset_client_month_totals(state).await?;
    tracing::info!(modified, "monthly client counters reset");
    Ok(modified)
}

/// Counts a newly ingested order against its client. Returns true when it
/// was the client's first order, in which case the new-client counters of
/// the order's month, year and the consolidated key are bumped too.
pub async fn record_order(
    state: &AppState,
    cliente_id: &ObjectId,
    total: f64,
    emitted_at: ChronoDateTime<Utc>,
) -> Result<bool> {
    record_order_in(state, cliente_id, total, emitted_at, None).await
}

/// Same as [`record_order`], inside the caller's transaction when a session
/// is given. Without one, a failed bump takes the client increment back so
/// the order can be counted again later.
pub async fn record_order_in(
    state: &AppState,
    cliente_id: &ObjectId,
    total: f64,
    emitted_at: ChronoDateTime<Utc>,
    mut session: Option<&mut ClientSession>,
) -> Result<bool> {
    let before = increment_client_counters_in(state, cliente_id, total, session.as_deref_mut())
        .await?
        .with_context(|| format!("client {cliente_id} not found"))?;

    let first_order = before.total == 0;
    if first_order {
        let (anio, mes) = periods::local_year_month(state.config.timezone, emitted_at);
        let targets = BucketKey::targets(mes, anio);
        let bumped = bump_new_client_counters_in(state, &targets, session.as_deref_mut()).await;
        if let Err(err) = bumped {
            if session.is_none() {
                if let Err(revert_err) = revert_client_counters(state, cliente_id, total).await {
                    tracing::warn!(cliente = %cliente_id, error = %revert_err, "client counter revert failed");
                }
            }
            return Err(err);
        }
        tracing::debug!(cliente = %cliente_id, "first order recorded");
    }
    Ok(first_order)
}
