// models.rs
// Domain models stored in MongoDB. Field names on disk are the camelCase
// Spanish names the front end already reads.

use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Lifecycle of an ingested document, stored as its number.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "i32", into = "i32")]
pub enum EstadoDocumento {
    #[default]
    Pendiente,
    Procesado,
    Aprobado,
    Eliminado,
}

impl EstadoDocumento {
    pub const ALL: [EstadoDocumento; 4] = [
        EstadoDocumento::Pendiente,
        EstadoDocumento::Procesado,
        EstadoDocumento::Aprobado,
        EstadoDocumento::Eliminado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoDocumento::Pendiente => "Pendiente",
            EstadoDocumento::Procesado => "Procesado",
            EstadoDocumento::Aprobado => "Aprobado",
            EstadoDocumento::Eliminado => "Eliminado",
        }
    }

    pub fn number(&self) -> i32 {
        i32::from(*self)
    }
}

impl From<EstadoDocumento> for i32 {
    fn from(value: EstadoDocumento) -> Self {
        match value {
            EstadoDocumento::Pendiente => 1,
            EstadoDocumento::Procesado => 2,
            EstadoDocumento::Aprobado => 3,
            EstadoDocumento::Eliminado => 4,
        }
    }
}

impl TryFrom<i32> for EstadoDocumento {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EstadoDocumento::Pendiente),
            2 => Ok(EstadoDocumento::Procesado),
            3 => Ok(EstadoDocumento::Aprobado),
            4 => Ok(EstadoDocumento::Eliminado),
            other => Err(format!("estado de documento desconocido: {other}")),
        }
    }
}

/// Catalog row in `estado_documento`, seeded on startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstadoDocumentoRow {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub nombre: String,
    pub estado_number: i32,
}

/// Alternate recipient attached to a document from the city update form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OtroDestinatario {
    pub persona_id: String,
    pub razon_social: String,
    pub telefonos: String,
    pub direccion: String,
    pub tipo: String,
    pub email: String,
    pub tipo_id: String,
}

/// Order/invoice record ingested from Contifico.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Documento {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub documento: String,
    #[serde(default)]
    pub estado: EstadoDocumento,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_ride: Option<String>,
    pub fecha_emision: DateTime,
    pub fecha_creacion: DateTime,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub costo_envio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_cliente: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_ciudad_destino: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_sucursal_destino: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_guia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_guia_pdf: Option<String>,
    pub tipo_documento: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canal_venta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usuario_comprador: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forma_pago: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otro_destinatario: Option<OtroDestinatario>,
}

/// Product line of a document, in `detalles_productos`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetalleProducto {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub id_documento: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_producto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(default)]
    pub precio: f64,
    #[serde(default)]
    pub cantidad: f64,
    #[serde(default)]
    pub porcentaje_descuento: f64,
    #[serde(default, rename = "porcentajeIVA")]
    pub porcentaje_iva: f64,
}

/// Customer record with lifetime and rolling-month counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub persona_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razon_social: Option<String>,
    #[serde(default)]
    pub telefonos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_creacion: Option<DateTime>,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub total_money: f64,
    #[serde(default)]
    pub total_mes: i64,
    #[serde(default)]
    pub total_money_mes: f64,
    #[serde(default)]
    pub nuevo: bool,
    #[serde(default)]
    pub frecuente: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ciudad {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sucursal {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_ciudad: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provincia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Destino {
    pub destino: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TipoEnvioTotal {
    pub tipo: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanalVenta {
    pub canal: String,
    pub total: i64,
    pub total_money: f64,
}

/// Sales summary for one `(mes, anio)` key. `mes == 0` is the yearly rollup,
/// `(0, 0)` the consolidated one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Venta {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub mes: i32,
    pub anio: i32,
    pub mes_label: String,
    pub total_ventas: f64,
    pub total_envios: f64,
    pub ventas_envios: f64,
    pub envios: i64,
    pub clientes_atendidos: i64,
    pub clientes_nuevos: i64,
    pub pedidos: i64,
    pub principales_destinos: Vec<Destino>,
    pub tipos_envio: Vec<TipoEnvioTotal>,
    pub canales_venta: Vec<CanalVenta>,
}

/// First-order counter per `(mes, anio)` key, fed by ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContadorClientesNuevos {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub mes: i32,
    pub anio: i32,
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institucion {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(default)]
    pub mes: i32,
    #[serde(default)]
    pub anio: i32,
}
