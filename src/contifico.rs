// contifico.rs
// Minimal client for the Contifico documents endpoint and the subset of its
// payload the ingestion path reads.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::Config;

/// Contifico sends amounts as strings ("12.50") and sometimes as numbers.
pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContificoPersona {
    #[serde(default)]
    pub cedula: Option<String>,
    #[serde(default)]
    pub ruc: Option<String>,
    #[serde(default)]
    pub razon_social: Option<String>,
    #[serde(default)]
    pub telefonos: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Product line of a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContificoDetalle {
    #[serde(default)]
    pub producto_id: Option<String>,
    #[serde(default)]
    pub producto_nombre: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub cantidad: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub precio: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub porcentaje_descuento: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub porcentaje_iva: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContificoDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub documento: Option<String>,
    #[serde(default)]
    pub tipo_documento: Option<String>,
    #[serde(default)]
    pub electronico: Option<bool>,
    #[serde(default)]
    pub fecha_emision: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub total: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub url_ride: Option<String>,
    #[serde(default)]
    pub referencia: Option<String>,
    #[serde(default)]
    pub adicional1: Option<String>,
    #[serde(default)]
    pub adicional2: Option<String>,
    #[serde(default)]
    pub persona: Option<ContificoPersona>,
    #[serde(default)]
    pub detalles: Option<Vec<ContificoDetalle>>,
}

#[derive(Clone)]
pub struct ContificoClient {
    http: reqwest::Client,
    uri: String,
    token: String,
}

impl ContificoClient {
    /// `None` when the endpoint or token is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        Some(ContificoClient {
            http: reqwest::Client::new(),
            uri: config.contifico_uri.clone()?,
            token: config.contifico_token.clone()?,
        })
    }

    /// Client documents emitted on `date`.
    pub async fn fetch_documents(&self, date: NaiveDate) -> Result<Vec<ContificoDocument>> {
        let fecha = date.format("%d/%m/%Y").to_string();
        let res = self
            .http
            .get(&self.uri)
            .query(&[("tipo_registro", "CLI"), ("fecha_emision", fecha.as_str())])
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .send()
            .await
            .context("contifico request failed")?;

        let status = res.status();
        if !status.is_success() {
            bail!("contifico answered {status}");
        }
        res.json::<Vec<ContificoDocument>>()
            .await
            .context("contifico payload is not a document list")
    }
}
