// catalog.rs
// Cities and branches that ingested documents point at: first-run branch
// seeding and names for cities known only by code.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, path::Path};

use crate::{
    contifico::text_or_number,
    models::Sucursal,
    servicli::ServicliClient,
    state::{AppState, count_branches, ensure_city, insert_branch, set_city_name, unnamed_cities},
};

/// One entry of the branch seed file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SucursalSeed {
    #[serde(default, deserialize_with = "text_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub id_ciudad: Option<String>,
    #[serde(default)]
    pub provincia: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
}

fn code(value: Option<&str>) -> Option<i32> {
    value?.trim().parse::<i32>().ok().filter(|c| *c != 0)
}

/// Seed files write missing values as the string "null".
fn text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "null")
        .map(str::to_string)
}

pub fn load_branch_seeds(path: &Path) -> Result<Vec<SucursalSeed>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading branch seeds from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing branch seeds in {}", path.display()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogReport {
    pub sucursales: usize,
    pub ciudades_creadas: usize,
    pub ciudades_nombradas: usize,
}

/// Loads the branches into an empty `sucursales` collection, creating the
/// cities they reference. Does nothing once any branch exists.
pub async fn seed_branches(state: &AppState, seeds: &[SucursalSeed]) -> Result<CatalogReport> {
    let mut report = CatalogReport::default();
    if count_branches(state).await? > 0 {
        tracing::debug!("branches already seeded");
        return Ok(report);
    }

    for seed in seeds {
        let Some(codigo) = code(seed.id.as_deref()) else {
            tracing::warn!(id = ?seed.id, "branch seed without code skipped");
            continue;
        };
        let id_ciudad = match code(seed.id_ciudad.as_deref()) {
            Some(ciudad) => {
                let (id, created) = ensure_city(state, ciudad).await?;
                if created {
                    report.ciudades_creadas += 1;
                }
                Some(id)
            }
            None => None,
        };
        insert_branch(
            state,
            &Sucursal {
                id: None,
                codigo: Some(codigo),
                id_ciudad,
                direccion: text(seed.direccion.as_deref()),
                provincia: text(seed.provincia.as_deref()),
                telefono: text(seed.telefono.as_deref()),
            },
        )
        .await?;
        report.sucursales += 1;
    }
    tracing::info!(
        sucursales = report.sucursales,
        ciudades = report.ciudades_creadas,
        "branches seeded"
    );
    Ok(report)
}

/// Name for an unnamed city: the courier catalog's name when it has one,
/// otherwise the city code itself.
pub fn city_name_for(codigo: Option<i32>, catalogo: &HashMap<i32, String>) -> Option<String> {
    let codigo = codigo?;
    Some(
        catalogo
            .get(&codigo)
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| codigo.to_string()),
    )
}

/// Names every unnamed city. Returns how many were named.
pub async fn name_cities(state: &AppState, catalogo: &HashMap<i32, String>) -> Result<usize> {
    let mut named = 0;
    for ciudad in unnamed_cities(state).await? {
        let (Some(id), Some(nombre)) = (ciudad.id, city_name_for(ciudad.codigo, catalogo)) else {
            continue;
        };
        set_city_name(state, &id, &nombre).await?;
        named += 1;
    }
    Ok(named)
}

/// City names from ServiCli, or an empty catalog when it is not configured
/// or unreachable.
async fn courier_catalog(state: &AppState) -> HashMap<i32, String> {
    let Some(client) = ServicliClient::from_config(&state.config) else {
        return HashMap::new();
    };
    match client.fetch_cities().await {
        Ok(cities) => cities
            .into_iter()
            .filter_map(|c| Some((c.codigo()?, c.nombre?)))
            .collect(),
        Err(err) => {
            tracing::warn!(error = %err, "city catalog unavailable, naming cities by code");
            HashMap::new()
        }
    }
}

/// Runs before each ingestion: seeds branches from the configured file and
/// names unnamed cities.
pub async fn refresh_catalog(state: &AppState) -> Result<CatalogReport> {
    let mut report = match &state.config.sucursales_file {
        Some(path) => seed_branches(state, &load_branch_seeds(path)?).await?,
        None => CatalogReport::default(),
    };

    if !unnamed_cities(state).await?.is_empty() {
        let catalogo = courier_catalog(state).await;
        report.ciudades_nombradas = name_cities(state, &catalogo).await?;
        tracing::info!(ciudades = report.ciudades_nombradas, "cities named");
    }
    Ok(report)
}
