use anyhow::{Context, Result};
use futures::stream::TryStreamExt;
use mongodb::{
    ClientSession,
    bson::{Document, doc, oid::ObjectId},
    options::ReturnDocument,
};

use crate::{clients::ClientStatusChange, models::Cliente};

use super::{AppState, begin_batch, finish_batch};

pub async fn list_clients(state: &AppState) -> Result<Vec<Cliente>> {
    let mut cursor = state.clientes.find(doc! {}).await?;
    let mut items = Vec::new();
    while let Some(cliente) = cursor.try_next().await? {
        items.push(cliente);
    }
    Ok(items)
}

pub async fn get_client_by_id(state: &AppState, id: &ObjectId) -> Result<Option<Cliente>> {
    state
        .clientes
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn find_client_by_persona(state: &AppState, persona_id: &str) -> Result<Option<Cliente>> {
    state
        .clientes
        .find_one(doc! { "personaId": persona_id })
        .await
        .map_err(Into::into)
}

pub async fn insert_client(state: &AppState, cliente: &Cliente) -> Result<ObjectId> {
    let res = state.clientes.insert_one(cliente).await?;
    res.inserted_id
        .as_object_id()
        .context("cliente insert missing _id")
}

/// Overwrites the contact fields that come from Contifico.
pub async fn update_client_contact(state: &AppState, id: &ObjectId, cliente: &Cliente) -> Result<()> {
    state
        .clientes
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "telefonos": cliente.telefonos.clone(),
                "direccion": cliente.direccion.clone(),
                "tipo": cliente.tipo.clone(),
                "email": cliente.email.clone(),
            } },
        )
        .await?;
    Ok(())
}

pub async fn count_new_clients(state: &AppState) -> Result<u64> {
    state
        .clientes
        .count_documents(doc! { "nuevo": true })
        .await
        .map_err(Into::into)
}

/// Applies every change or none. Without atomic writes (standalone server)
/// the changes go out one by one.
pub async fn apply_status_changes(state: &AppState, changes: &[ClientStatusChange]) -> Result<()> {
    if changes.is_empty() {
        return Ok(());
    }

    let mut session = begin_batch(state).await?;
    let applied: Result<()> = async {
        for change in changes {
            let mut update = state
                .clientes
                .update_one(doc! { "_id": change.id }, change.to_update());
            if let Some(session) = session.as_mut() {
                update = update.session(session);
            }
            update
                .await
                .with_context(|| format!("updating client {}", change.id))?;
        }
        Ok(())
    }
    .await;
    finish_batch(session, applied).await
}

/// Zeroes the rolling-month counters of every client.
pub async fn reset_client_month_totals(state: &AppState) -> Result<u64> {
    let res = state
        .clientes
        .update_many(
            doc! {},
            doc! { "$set": { "totalMes": 0_i64, "totalMoneyMes": 0.0_f64 } },
        )
        .await?;
    Ok(res.modified_count)
}

/// Bumps lifetime and monthly counters; returns the record as it was
/// before the increment.
pub async fn increment_client_counters_in(
    state: &AppState,
    id: &ObjectId,
    total: f64,
    session: Option<&mut ClientSession>,
) -> Result<Option<Cliente>> {
    let mut update = state
        .clientes
        .find_one_and_update(doc! { "_id": id }, counters_inc(1, total))
        .return_document(ReturnDocument::Before);
    if let Some(session) = session {
        update = update.session(session);
    }
    update.await.map_err(Into::into)
}

/// Takes back one order of `total` from the client counters.
pub async fn revert_client_counters(state: &AppState, id: &ObjectId, total: f64) -> Result<()> {
    state
        .clientes
        .update_one(doc! { "_id": id }, counters_inc(-1, -total))
        .await?;
    Ok(())
}

fn counters_inc(pedidos: i64, total: f64) -> Document {
    doc! { "$inc": {
        "total": pedidos,
        "totalMoney": total,
        "totalMes": pedidos,
        "totalMoneyMes": total,
    } }
}
