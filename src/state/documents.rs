use anyhow::{Context, Result};
use chrono::{DateTime as ChronoDateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::{
    ClientSession,
    bson::{DateTime, Document, doc, oid::ObjectId, to_bson},
};

use crate::{
    models::{DetalleProducto, Documento, OtroDestinatario},
    periods,
};

use super::AppState;

/// Documents emitted in `[from, to)`.
pub async fn documents_in_range(
    state: &AppState,
    from: ChronoDateTime<Utc>,
    to: ChronoDateTime<Utc>,
) -> Result<Vec<Documento>> {
    let mut cursor = state
        .documentos
        .find(doc! {
            "fechaEmision": { "$gte": DateTime::from_chrono(from), "$lt": DateTime::from_chrono(to) }
        })
        .await?;
    let mut items = Vec::new();
    while let Some(documento) = cursor.try_next().await? {
        items.push(documento);
    }
    Ok(items)
}

/// Documents emitted during `year` in the business time zone.
pub async fn documents_in_year(state: &AppState, year: i32) -> Result<Vec<Documento>> {
    let (from, to) = periods::year_bounds(state.config.timezone, year)
        .with_context(|| format!("no local midnight for year {year}"))?;
    documents_in_range(state, from, to).await
}

pub async fn get_document_by_id(state: &AppState, id: &ObjectId) -> Result<Option<Documento>> {
    state
        .documentos
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn find_document_by_numero(state: &AppState, numero: &str) -> Result<Option<Documento>> {
    state
        .documentos
        .find_one(doc! { "documento": numero })
        .await
        .map_err(Into::into)
}

pub async fn insert_document(state: &AppState, documento: &Documento) -> Result<ObjectId> {
    insert_document_in(state, documento, None).await
}

pub async fn insert_document_in(
    state: &AppState,
    documento: &Documento,
    session: Option<&mut ClientSession>,
) -> Result<ObjectId> {
    let mut insert = state.documentos.insert_one(documento);
    if let Some(session) = session {
        insert = insert.session(session);
    }
    let res = insert.await?;
    res.inserted_id
        .as_object_id()
        .context("documento insert missing _id")
}

/// Removes a document together with its product lines.
pub async fn delete_document(state: &AppState, id: &ObjectId) -> Result<()> {
    state
        .detalles
        .delete_many(doc! { "idDocumento": id })
        .await?;
    state.documentos.delete_one(doc! { "_id": id }).await?;
    Ok(())
}

pub async fn list_details(state: &AppState, id_documento: &ObjectId) -> Result<Vec<DetalleProducto>> {
    let mut cursor = state
        .detalles
        .find(doc! { "idDocumento": id_documento })
        .await?;
    let mut items = Vec::new();
    while let Some(detalle) = cursor.try_next().await? {
        items.push(detalle);
    }
    Ok(items)
}

/// Inserts a product line unless an identical one (same document, product,
/// name, price, quantity, discount and VAT) is already stored. Returns true
/// when a row was written.
pub async fn save_detail_in(
    state: &AppState,
    detalle: &DetalleProducto,
    mut session: Option<&mut ClientSession>,
) -> Result<bool> {
    let filter = doc! {
        "idDocumento": detalle.id_documento,
        "idProducto": detalle.id_producto.clone(),
        "nombre": detalle.nombre.clone(),
        "precio": detalle.precio,
        "cantidad": detalle.cantidad,
        "porcentajeDescuento": detalle.porcentaje_descuento,
        "porcentajeIVA": detalle.porcentaje_iva,
    };
    let mut find = state.detalles.find_one(filter);
    if let Some(session) = session.as_deref_mut() {
        find = find.session(session);
    }
    if find.await?.is_some() {
        return Ok(false);
    }

    let mut insert = state.detalles.insert_one(detalle);
    if let Some(session) = session {
        insert = insert.session(session);
    }
    insert.await?;
    Ok(true)
}

/// Destination fields set from the city update form. `None` leaves the
/// stored value untouched.
#[derive(Debug, Clone)]
pub struct DestinationUpdate {
    pub id_ciudad_destino: ObjectId,
    pub id_sucursal_destino: Option<ObjectId>,
    pub costo_envio: Option<f64>,
    pub otro_destinatario: Option<OtroDestinatario>,
}

impl DestinationUpdate {
    fn to_set(&self) -> Result<Document> {
        let mut set = doc! { "idCiudadDestino": self.id_ciudad_destino };
        if let Some(sucursal) = self.id_sucursal_destino {
            set.insert("idSucursalDestino", sucursal);
        }
        if let Some(costo) = self.costo_envio {
            set.insert("costoEnvio", costo);
        }
        if let Some(otro) = &self.otro_destinatario {
            set.insert("otroDestinatario", to_bson(otro)?);
        }
        Ok(set)
    }
}

/// Returns false when no document has that id.
pub async fn update_document_destination(
    state: &AppState,
    id: &ObjectId,
    update: &DestinationUpdate,
) -> Result<bool> {
    let res = state
        .documentos
        .update_one(doc! { "_id": id }, doc! { "$set": update.to_set()? })
        .await?;
    Ok(res.matched_count > 0)
}
