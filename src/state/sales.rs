use anyhow::{Context, Result};
use futures::stream::TryStreamExt;
use mongodb::{
    ClientSession,
    bson::{doc, oid::ObjectId},
};

use crate::{models::Venta, ventas::BucketKey};

use super::AppState;

pub async fn list_buckets(state: &AppState) -> Result<Vec<Venta>> {
    let mut cursor = state
        .ventas
        .find(doc! {})
        .sort(doc! { "anio": 1, "mes": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(venta) = cursor.try_next().await? {
        items.push(venta);
    }
    Ok(items)
}

pub async fn find_bucket(state: &AppState, key: BucketKey) -> Result<Option<Venta>> {
    find_bucket_in(state, key, None).await
}

pub async fn find_bucket_in(
    state: &AppState,
    key: BucketKey,
    session: Option<&mut ClientSession>,
) -> Result<Option<Venta>> {
    let mut find = state.ventas.find_one(doc! { "mes": key.mes, "anio": key.anio });
    if let Some(session) = session {
        find = find.session(session);
    }
    find.await.map_err(Into::into)
}

pub async fn upsert_bucket(state: &AppState, venta: Venta) -> Result<ObjectId> {
    upsert_bucket_in(state, venta, None).await
}

/// Replaces the stored bucket for the same `(mes, anio)` in full, keeping its
/// `_id`, or inserts a new one.
pub async fn upsert_bucket_in(
    state: &AppState,
    mut venta: Venta,
    mut session: Option<&mut ClientSession>,
) -> Result<ObjectId> {
    let key = BucketKey::new(venta.mes, venta.anio);
    let existing = find_bucket_in(state, key, session.as_deref_mut())
        .await?
        .and_then(|existing| existing.id);
    match existing {
        Some(id) => {
            venta.id = Some(id);
            let mut replace = state.ventas.replace_one(doc! { "_id": id }, &venta);
            if let Some(session) = session {
                replace = replace.session(session);
            }
            replace.await?;
            tracing::debug!(mes = key.mes, anio = key.anio, "bucket replaced");
            Ok(id)
        }
        None => {
            venta.id = None;
            let mut insert = state.ventas.insert_one(&venta);
            if let Some(session) = session {
                insert = insert.session(session);
            }
            let res = insert.await?;
            tracing::debug!(mes = key.mes, anio = key.anio, "bucket inserted");
            res.inserted_id
                .as_object_id()
                .context("venta insert missing _id")
        }
    }
}

pub async fn new_client_counter(state: &AppState, key: BucketKey) -> Result<i64> {
    Ok(state
        .clientes_nuevos
        .find_one(doc! { "mes": key.mes, "anio": key.anio })
        .await?
        .map(|c| c.total)
        .unwrap_or(0))
}

pub async fn bump_new_client_counters(state: &AppState, keys: &[BucketKey]) -> Result<()> {
    bump_new_client_counters_in(state, keys, None).await
}

pub async fn bump_new_client_counters_in(
    state: &AppState,
    keys: &[BucketKey],
    mut session: Option<&mut ClientSession>,
) -> Result<()> {
    for key in keys {
        let mut update = state
            .clientes_nuevos
            .update_one(
                doc! { "mes": key.mes, "anio": key.anio },
                doc! { "$inc": { "total": 1_i64 } },
            )
            .upsert(true);
        if let Some(session) = session.as_deref_mut() {
            update = update.session(session);
        }
        update.await?;
    }
    Ok(())
}
