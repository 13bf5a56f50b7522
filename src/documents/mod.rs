// documents: ingestion of Contifico documents and destination updates.

use anyhow::{Context, Result};
use chrono::{DateTime as ChronoDateTime, Utc};
use mongodb::{
    ClientSession,
    bson::{DateTime, oid::ObjectId},
};
use serde::Deserialize;

use crate::{
    clients::record_order_in,
    contifico::ContificoDocument,
    error::AppError,
    models::{Cliente, DetalleProducto, Documento, EstadoDocumento, OtroDestinatario},
    state::{
        AppState, DestinationUpdate, begin_batch, delete_document, find_branch_by_code,
        find_city_by_code, find_client_by_persona, find_document_by_numero, finish_batch,
        get_document_by_id, insert_client, insert_document_in, save_detail_in,
        update_client_contact, update_document_destination,
    },
};

mod parse;

pub use parse::*;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub guardados: usize,
    pub existentes: usize,
    pub descartados: usize,
    pub detalles: usize,
}

impl IngestReport {
    pub fn message(&self) -> String {
        format!(
            "Documentos guardados: {} nuevos, {} ya existentes, {} descartados, {} detalles de productos",
            self.guardados, self.existentes, self.descartados, self.detalles
        )
    }
}

fn contact_changed(stored: &Cliente, incoming: &IncomingClient) -> bool {
    stored.telefonos != incoming.telefonos
        || stored.direccion != incoming.direccion
        || stored.tipo != incoming.tipo
        || stored.email != incoming.email
}

/// Returns the client id, inserting the client or refreshing its contact
/// fields as needed.
pub async fn save_client(state: &AppState, incoming: &IncomingClient, now: ChronoDateTime<Utc>) -> Result<ObjectId> {
    let candidate = Cliente {
        id: None,
        persona_id: incoming.persona_id.clone(),
        tipo_id: Some(incoming.tipo_id.clone()),
        razon_social: incoming.razon_social.clone(),
        telefonos: incoming.telefonos.clone(),
        direccion: incoming.direccion.clone(),
        tipo: incoming.tipo.clone(),
        email: incoming.email.clone(),
        fecha_creacion: Some(DateTime::from_chrono(now)),
        total: 0,
        total_money: 0.0,
        total_mes: 0,
        total_money_mes: 0.0,
        nuevo: true,
        frecuente: false,
    };

    match find_client_by_persona(state, &incoming.persona_id).await? {
        Some(stored) => {
            let id = stored.id.context("stored client without _id")?;
            if contact_changed(&stored, incoming) {
                update_client_contact(state, &id, &candidate).await?;
                tracing::debug!(persona = %incoming.persona_id, "client contact updated");
            }
            Ok(id)
        }
        None => {
            let id = insert_client(state, &candidate).await?;
            tracing::info!(persona = %incoming.persona_id, "client created");
            Ok(id)
        }
    }
}

fn detail_row(id_documento: ObjectId, detalle: &IncomingDetalle) -> DetalleProducto {
    DetalleProducto {
        id: None,
        id_documento,
        id_producto: detalle.id_producto.clone(),
        nombre: detalle.nombre.clone(),
        precio: detalle.precio,
        cantidad: detalle.cantidad,
        porcentaje_descuento: detalle.porcentaje_descuento,
        porcentaje_iva: detalle.porcentaje_iva,
    }
}

/// Stores the product lines of a document, skipping lines already stored.
/// Returns how many were written.
pub async fn save_details(
    state: &AppState,
    id_documento: ObjectId,
    detalles: &[IncomingDetalle],
    mut session: Option<&mut ClientSession>,
) -> Result<usize> {
    let mut saved = 0;
    for detalle in detalles {
        if save_detail_in(state, &detail_row(id_documento, detalle), session.as_deref_mut()).await? {
            saved += 1;
        }
    }
    Ok(saved)
}

/// Writes a new document with its product lines and counts it against its
/// client. With atomic writes everything commits together; otherwise the
/// document is removed again when counting fails, so a retry sees it as new.
pub async fn persist_order(
    state: &AppState,
    documento: &Documento,
    detalles: &[IncomingDetalle],
) -> Result<(ObjectId, usize)> {
    let cliente_id = documento
        .id_cliente
        .with_context(|| format!("document {} has no client", documento.documento))?;

    let mut session = begin_batch(state).await?;
    let written: Result<(ObjectId, usize)> = async {
        let id = insert_document_in(state, documento, session.as_mut())
            .await
            .with_context(|| format!("saving document {}", documento.documento))?;

        let counted = async {
            let saved = save_details(state, id, detalles, session.as_mut()).await?;
            record_order_in(
                state,
                &cliente_id,
                documento.total,
                documento.fecha_emision.to_chrono(),
                session.as_mut(),
            )
            .await?;
            Ok::<_, anyhow::Error>(saved)
        }
        .await;

        match counted {
            Ok(saved) => Ok((id, saved)),
            Err(err) => {
                if session.is_none() {
                    if let Err(undo_err) = delete_document(state, &id).await {
                        tracing::warn!(documento = %documento.documento, error = %undo_err, "document rollback failed");
                    }
                }
                Err(err)
            }
        }
    }
    .await;
    finish_batch(session, written).await
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SavedOrder {
    /// False when the document number was already stored.
    pub nuevo: bool,
    pub detalles: usize,
}

/// Stores one parsed order and counts it against its client. An order that
/// is already stored only gets its missing product lines.
pub async fn save_order(state: &AppState, order: &IncomingOrder, now: ChronoDateTime<Utc>) -> Result<SavedOrder> {
    if let Some(existing) = find_document_by_numero(state, &order.documento).await? {
        let id = existing.id.context("stored document without _id")?;
        let detalles = save_details(state, id, &order.detalles, None).await?;
        return Ok(SavedOrder { nuevo: false, detalles });
    }

    let cliente_id = save_client(state, &order.cliente, now).await?;

    let id_ciudad_destino = match order.ciudad_codigo {
        Some(codigo) => find_city_by_code(state, codigo).await?.and_then(|c| c.id),
        None => None,
    };
    let id_sucursal_destino = match order.sucursal_codigo {
        Some(codigo) => find_branch_by_code(state, codigo).await?.and_then(|s| s.id),
        None => None,
    };

    let documento = Documento {
        id: None,
        documento: order.documento.clone(),
        estado: EstadoDocumento::Pendiente,
        url_ride: order.url_ride.clone(),
        fecha_emision: DateTime::from_chrono(order.fecha_emision),
        fecha_creacion: DateTime::from_chrono(now),
        total: order.total,
        costo_envio: order.costo_envio,
        descripcion: order.descripcion.clone(),
        id_cliente: Some(cliente_id),
        id_ciudad_destino,
        id_sucursal_destino,
        id_guia: None,
        url_guia_pdf: None,
        tipo_documento: order.tipo_documento.clone(),
        canal_venta: order.canal_venta.clone(),
        usuario_comprador: order.usuario_comprador.clone(),
        forma_pago: order.forma_pago.clone(),
        otro_destinatario: None,
    };
    let (_, detalles) = persist_order(state, &documento, &order.detalles).await?;

    tracing::info!(documento = %order.documento, detalles, "document saved");
    Ok(SavedOrder { nuevo: true, detalles })
}

/// Ingests a batch of raw documents. Rejected documents are skipped; store
/// failures abort the batch.
pub async fn ingest(state: &AppState, raw_docs: &[ContificoDocument], now: ChronoDateTime<Utc>) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    for raw in raw_docs {
        let order = match parse_document(raw, now, state.config.timezone) {
            Ok(order) => order,
            Err(reason) => {
                tracing::debug!(documento = ?raw.documento, %reason, "document skipped");
                report.descartados += 1;
                continue;
            }
        };
        let saved = save_order(state, &order, now).await?;
        if saved.nuevo {
            report.guardados += 1;
        } else {
            report.existentes += 1;
        }
        report.detalles += saved.detalles;
    }
    Ok(report)
}

/// Body of the destination update form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCityRequest {
    pub id: Option<String>,
    pub id_ciudad: Option<i32>,
    pub id_sucursal: Option<i32>,
    pub costo_envio: Option<f64>,
    pub id_cliente: Option<String>,
    pub razon_social: Option<String>,
    pub telefonos: Option<String>,
    pub direccion: Option<String>,
    pub tipo: Option<String>,
    pub email: Option<String>,
}

impl UpdateCityRequest {
    /// The alternate recipient, only when every field is present.
    pub fn otro_destinatario(&self) -> Option<OtroDestinatario> {
        let persona_id = self.id_cliente.clone()?;
        Some(OtroDestinatario {
            tipo_id: tipo_id_for(&persona_id).to_string(),
            persona_id,
            razon_social: self.razon_social.clone()?,
            telefonos: self.telefonos.clone()?,
            direccion: self.direccion.clone()?,
            tipo: self.tipo.clone()?,
            email: self.email.clone()?,
        })
    }
}

/// Sets the destination city (and optionally branch, shipping cost and
/// alternate recipient) of a stored document.
pub async fn update_document_city(state: &AppState, req: &UpdateCityRequest) -> Result<ObjectId, AppError> {
    let (Some(id), Some(ciudad)) = (req.id.as_deref(), req.id_ciudad) else {
        return Err(AppError::BadRequest(
            "Parametros requeridos: id, id_ciudad".to_string(),
        ));
    };
    if ciudad == 0 {
        return Err(AppError::BadRequest(
            "Ciudad de destino no puede ser nulo".to_string(),
        ));
    }
    let id = ObjectId::parse_str(id)
        .map_err(|_| AppError::BadRequest(format!("id de documento inválido: {id}")))?;

    let not_found = || AppError::NotFound("No se pudo obtener la ciudad o sucursal especificada".to_string());
    let id_ciudad_destino = find_city_by_code(state, ciudad)
        .await?
        .and_then(|c| c.id)
        .ok_or_else(not_found)?;
    let id_sucursal_destino = match req.id_sucursal.filter(|s| *s != 0) {
        Some(codigo) => Some(
            find_branch_by_code(state, codigo)
                .await?
                .and_then(|s| s.id)
                .ok_or_else(not_found)?,
        ),
        None => None,
    };

    if get_document_by_id(state, &id).await?.is_none() {
        return Err(AppError::NotFound(format!("Documento {id} no existe")));
    }

    let update = DestinationUpdate {
        id_ciudad_destino,
        id_sucursal_destino,
        costo_envio: req.costo_envio,
        otro_destinatario: req.otro_destinatario(),
    };
    if !update_document_destination(state, &id, &update).await? {
        return Err(AppError::NotFound(format!("Documento {id} no existe")));
    }
    tracing::info!(documento = %id, "document destination updated");
    Ok(id)
}
