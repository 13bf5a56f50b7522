// Conversion of raw Contifico documents into typed orders.
//
// Conventions of the source system:
// - `adicional1` is `costoEnvio-canal-usuarioComprador`
// - `adicional2` is the payment form
// - `referencia` is `codigoCiudad-codigoSucursal-direccionExtra`
// - `fecha_emision` is dd/mm/yyyy in local time

use chrono::{DateTime as ChronoDateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use crate::contifico::{ContificoDetalle, ContificoDocument, ContificoPersona};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("tipo de documento no admitido: {0}")]
    TipoNoAdmitido(String),
    #[error("documento sin número")]
    SinNumero,
    #[error("documento sin cliente identificable")]
    SinCliente,
    #[error("total inválido: {0}")]
    TotalInvalido(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncomingClient {
    pub persona_id: String,
    pub tipo_id: String,
    pub razon_social: Option<String>,
    pub telefonos: Vec<String>,
    pub direccion: Option<String>,
    pub tipo: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncomingDetalle {
    pub id_producto: Option<String>,
    pub nombre: Option<String>,
    pub precio: f64,
    pub cantidad: f64,
    pub porcentaje_descuento: f64,
    pub porcentaje_iva: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncomingOrder {
    pub documento: String,
    pub tipo_documento: String,
    pub url_ride: Option<String>,
    pub descripcion: Option<String>,
    pub fecha_emision: ChronoDateTime<Utc>,
    pub total: f64,
    pub costo_envio: f64,
    pub canal_venta: Option<String>,
    pub usuario_comprador: Option<String>,
    pub forma_pago: Option<String>,
    pub ciudad_codigo: Option<i32>,
    pub sucursal_codigo: Option<i32>,
    pub cliente: IncomingClient,
    pub detalles: Vec<IncomingDetalle>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// "CEDULA" for 10-character ids, "RUC" otherwise.
pub fn tipo_id_for(persona_id: &str) -> &'static str {
    if persona_id.chars().count() == 10 {
        "CEDULA"
    } else {
        "RUC"
    }
}

/// Only electronic invoices and pre-invoices are ingested.
pub fn is_ingestable(raw: &ContificoDocument) -> bool {
    match raw.tipo_documento.as_deref() {
        Some("FAC") => raw.electronico.unwrap_or(false),
        Some("PRE") => true,
        _ => false,
    }
}

/// Shipping cost, channel and buyer from `adicional1`. A missing or
/// non-numeric cost counts as zero.
pub fn split_adicional1(adicional1: Option<&str>) -> (f64, Option<String>, Option<String>) {
    let Some(raw) = adicional1 else {
        return (0.0, None, None);
    };
    let mut parts = raw.split('-');
    let costo = parts
        .next()
        .and_then(|c| c.trim().parse::<f64>().ok())
        .filter(|c| c.is_finite())
        .unwrap_or(0.0);
    let canal = non_empty(parts.next());
    let usuario = non_empty(parts.next());
    (costo, canal, usuario)
}

/// Positive numeric code or `None`.
fn code(part: Option<&str>) -> Option<i32> {
    part.and_then(|p| p.trim().parse::<i32>().ok())
        .filter(|c| *c != 0)
}

/// City code, branch code and extra address line from `referencia`.
pub fn split_referencia(referencia: Option<&str>) -> (Option<i32>, Option<i32>, Option<String>) {
    let Some(raw) = referencia.filter(|r| !r.trim().is_empty()) else {
        return (None, None, None);
    };
    let mut parts = raw.split('-');
    let ciudad = code(parts.next());
    let sucursal = code(parts.next());
    let extra = non_empty(parts.next());
    (ciudad, sucursal, extra)
}

/// dd/mm/yyyy at local midnight.
pub fn parse_fecha_emision(value: &str, tz: Tz) -> Option<ChronoDateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value.trim(), "%d/%m/%Y").ok()?;
    tz.from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .earliest()
        .map(|d| d.with_timezone(&Utc))
}

fn parse_client(persona: &ContificoPersona, extra_direccion: Option<String>) -> Option<IncomingClient> {
    let persona_id = non_empty(persona.cedula.as_deref()).or_else(|| non_empty(persona.ruc.as_deref()))?;

    let direccion = match (non_empty(persona.direccion.as_deref()), extra_direccion) {
        (Some(base), Some(extra)) => Some(format!("{base} - {extra}")),
        (Some(base), None) => Some(base),
        (None, extra) => extra,
    };

    let telefonos = persona
        .telefonos
        .as_deref()
        .map(|t| {
            t.split('/')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let email = persona
        .email
        .as_deref()
        .and_then(|e| e.split_whitespace().next())
        .map(str::to_string);

    Some(IncomingClient {
        tipo_id: tipo_id_for(&persona_id).to_string(),
        persona_id,
        razon_social: non_empty(persona.razon_social.as_deref()),
        telefonos,
        direccion,
        tipo: non_empty(persona.tipo.as_deref()),
        email,
    })
}

/// Unparseable amounts count as zero.
fn amount(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub fn parse_detalle(raw: &ContificoDetalle) -> IncomingDetalle {
    IncomingDetalle {
        id_producto: non_empty(raw.producto_id.as_deref()),
        nombre: non_empty(raw.producto_nombre.as_deref()),
        precio: amount(raw.precio.as_deref()),
        cantidad: amount(raw.cantidad.as_deref()),
        porcentaje_descuento: amount(raw.porcentaje_descuento.as_deref()),
        porcentaje_iva: amount(raw.porcentaje_iva.as_deref()),
    }
}

/// Validates a raw document. `now` is the emission date used when the
/// document carries no parseable date.
pub fn parse_document(raw: &ContificoDocument, now: ChronoDateTime<Utc>, tz: Tz) -> Result<IncomingOrder, Rejection> {
    if !is_ingestable(raw) {
        return Err(Rejection::TipoNoAdmitido(
            raw.tipo_documento.clone().unwrap_or_default(),
        ));
    }
    let documento = non_empty(raw.documento.as_deref()).ok_or(Rejection::SinNumero)?;

    let total_text = raw.total.as_deref().unwrap_or("0").trim();
    let total = total_text
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| Rejection::TotalInvalido(total_text.to_string()))?;

    let (costo_envio, canal_venta, usuario_comprador) = split_adicional1(raw.adicional1.as_deref());
    let (ciudad_codigo, sucursal_codigo, extra_direccion) = split_referencia(raw.referencia.as_deref());

    let cliente = raw
        .persona
        .as_ref()
        .and_then(|p| parse_client(p, extra_direccion))
        .ok_or(Rejection::SinCliente)?;

    let fecha_emision = raw
        .fecha_emision
        .as_deref()
        .and_then(|f| parse_fecha_emision(f, tz))
        .unwrap_or(now);

    Ok(IncomingOrder {
        documento,
        tipo_documento: raw.tipo_documento.clone().unwrap_or_default(),
        url_ride: non_empty(raw.url_ride.as_deref()),
        descripcion: non_empty(raw.descripcion.as_deref()),
        fecha_emision,
        total,
        costo_envio,
        canal_venta,
        usuario_comprador,
        forma_pago: non_empty(raw.adicional2.as_deref()),
        ciudad_codigo,
        sucursal_codigo,
        cliente,
        detalles: raw
            .detalles
            .iter()
            .flatten()
            .map(parse_detalle)
            .collect(),
    })
}
