// config.rs
// Runtime configuration read from the environment (.env is loaded by main).

use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use std::{env, net::SocketAddr, path::PathBuf};

/// How `clientesNuevos` is filled in every sales bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientesNuevosMode {
    /// Live count of clients flagged `nuevo`, the same value in every bucket.
    Snapshot,
    /// Per-bucket counter bumped on each client's first order.
    Accumulated,
}

impl ClientesNuevosMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Some(ClientesNuevosMode::Snapshot),
            "accumulated" | "acumulado" => Some(ClientesNuevosMode::Accumulated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub bind_addr: SocketAddr,
    pub timezone: Tz,
    pub canal_excluido: String,
    pub clientes_nuevos: ClientesNuevosMode,
    pub frecuente_min_pedidos: u32,
    pub atomic_writes: bool,
    pub contifico_uri: Option<String>,
    pub contifico_token: Option<String>,
    pub servicli_uri: Option<String>,
    pub servicli_user: Option<String>,
    pub servicli_pass: Option<String>,
    /// JSON list of branches loaded into an empty `sucursales` collection.
    pub sucursales_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mongodb_uri =
            env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let mongodb_db = env::var("MONGODB_DB").unwrap_or_else(|_| "vanu".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be host:port")?;

        let timezone = env::var("VANU_TIMEZONE")
            .unwrap_or_else(|_| "America/Guayaquil".to_string())
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid VANU_TIMEZONE: {e}"))?;

        let canal_excluido = env::var("VANU_CANAL_EXCLUIDO").unwrap_or_else(|_| "DS".to_string());

        let clientes_nuevos = match env::var("VANU_CLIENTES_NUEVOS") {
            Ok(raw) => ClientesNuevosMode::parse(&raw)
                .with_context(|| format!("invalid VANU_CLIENTES_NUEVOS: {raw}"))?,
            Err(_) => ClientesNuevosMode::Snapshot,
        };

        let frecuente_min_pedidos = match env::var("VANU_FRECUENTE_MIN") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("invalid VANU_FRECUENTE_MIN: {raw}"))?,
            Err(_) => 3,
        };

        let atomic_writes = env::var("VANU_ATOMIC_WRITES")
            .map(|v| !matches!(v.trim(), "0" | "false" | "no"))
            .unwrap_or(true);

        Ok(Config {
            mongodb_uri,
            mongodb_db,
            bind_addr,
            timezone,
            canal_excluido,
            clientes_nuevos,
            frecuente_min_pedidos,
            atomic_writes,
            contifico_uri: non_empty_var("CONTIFICO_URI_DOCUMENT"),
            contifico_token: non_empty_var("CONTIFICO_AUTH_TOKEN"),
            servicli_uri: non_empty_var("SERVICLI_URI_CIUDADES"),
            servicli_user: non_empty_var("SERVICLI_AUTH_USER"),
            servicli_pass: non_empty_var("SERVICLI_AUTH_PASS"),
            sucursales_file: non_empty_var("VANU_SUCURSALES_FILE").map(PathBuf::from),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clientes_nuevos_mode_accepts_both_spellings() {
        assert_eq!(
            ClientesNuevosMode::parse("Snapshot"),
            Some(ClientesNuevosMode::Snapshot)
        );
        assert_eq!(
            ClientesNuevosMode::parse("acumulado"),
            Some(ClientesNuevosMode::Accumulated)
        );
        assert_eq!(ClientesNuevosMode::parse("weekly"), None);
    }
}
