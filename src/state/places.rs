use anyhow::{Context, Result};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};

use crate::models::{Ciudad, Sucursal};

use super::AppState;

/// Display name of a city, `None` when the city or its name is missing.
pub async fn city_name(state: &AppState, id: &ObjectId) -> Result<Option<String>> {
    Ok(state
        .ciudades
        .find_one(doc! { "_id": id })
        .await?
        .and_then(|c| c.nombre)
        .filter(|n| !n.trim().is_empty()))
}

pub async fn find_city_by_code(state: &AppState, codigo: i32) -> Result<Option<Ciudad>> {
    state
        .ciudades
        .find_one(doc! { "codigo": codigo })
        .await
        .map_err(Into::into)
}

pub async fn find_branch_by_code(state: &AppState, codigo: i32) -> Result<Option<Sucursal>> {
    state
        .sucursales
        .find_one(doc! { "codigo": codigo })
        .await
        .map_err(Into::into)
}

/// Cities with no usable name.
pub async fn unnamed_cities(state: &AppState) -> Result<Vec<Ciudad>> {
    let mut cursor = state
        .ciudades
        .find(doc! { "$or": [ { "nombre": null }, { "nombre": "" } ] })
        .await?;
    let mut items = Vec::new();
    while let Some(ciudad) = cursor.try_next().await? {
        items.push(ciudad);
    }
    Ok(items)
}

pub async fn set_city_name(state: &AppState, id: &ObjectId, nombre: &str) -> Result<()> {
    state
        .ciudades
        .update_one(doc! { "_id": id }, doc! { "$set": { "nombre": nombre } })
        .await?;
    Ok(())
}

/// Id of the city with `codigo`, creating an unnamed one when missing.
/// The flag is true when the city was created.
pub async fn ensure_city(state: &AppState, codigo: i32) -> Result<(ObjectId, bool)> {
    if let Some(id) = find_city_by_code(state, codigo).await?.and_then(|c| c.id) {
        return Ok((id, false));
    }
    let res = state
        .ciudades
        .insert_one(Ciudad {
            id: None,
            codigo: Some(codigo),
            nombre: None,
        })
        .await?;
    let id = res
        .inserted_id
        .as_object_id()
        .context("ciudad insert missing _id")?;
    Ok((id, true))
}

pub async fn count_branches(state: &AppState) -> Result<u64> {
    state
        .sucursales
        .count_documents(doc! {})
        .await
        .map_err(Into::into)
}

pub async fn insert_branch(state: &AppState, sucursal: &Sucursal) -> Result<ObjectId> {
    let res = state.sucursales.insert_one(sucursal).await?;
    res.inserted_id
        .as_object_id()
        .context("sucursal insert missing _id")
}
