// state module: AppState, initialization, and re-exports of submodules.

use anyhow::Result;
use mongodb::{Client, Collection};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::models::{
    Ciudad, Cliente, ContadorClientesNuevos, DetalleProducto, Documento, EstadoDocumentoRow,
    Institucion, Sucursal, Venta,
};

mod seed;
mod batch;
mod documents;
mod clients;
mod sales;
mod places;
mod institution;

pub use batch::*;
pub use documents::*;
pub use clients::*;
pub use sales::*;
pub use places::*;
pub use institution::*;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub client: Client,
    pub documentos: Collection<Documento>,
    pub detalles: Collection<DetalleProducto>,
    pub clientes: Collection<Cliente>,
    pub ciudades: Collection<Ciudad>,
    pub sucursales: Collection<Sucursal>,
    pub ventas: Collection<Venta>,
    pub clientes_nuevos: Collection<ContadorClientesNuevos>,
    pub institucion: Collection<Institucion>,
    pub estados_documento: Collection<EstadoDocumentoRow>,
    /// Held for the whole sales aggregation run.
    pub ventas_lock: Arc<Mutex<()>>,
    /// Held by the client status pass and the monthly reset.
    pub clientes_lock: Arc<Mutex<()>>,
}

pub async fn init_state() -> Result<AppState> {
    init_state_with(Config::from_env()?).await
}

pub async fn init_state_with(config: Config) -> Result<AppState> {
    let client = Client::with_uri_str(&config.mongodb_uri).await?;
    let db = client.database(&config.mongodb_db);

    seed::ensure_collections(&db).await?;
    seed::ensure_indexes(&db).await?;
    seed::seed_document_states(&db).await?;

    tracing::info!(db = %config.mongodb_db, "MongoDB state ready");

    Ok(AppState {
        documentos: db.collection::<Documento>(seed::DOCUMENTOS),
        detalles: db.collection::<DetalleProducto>(seed::DETALLES_PRODUCTOS),
        clientes: db.collection::<Cliente>(seed::CLIENTES),
        ciudades: db.collection::<Ciudad>(seed::CIUDADES),
        sucursales: db.collection::<Sucursal>(seed::SUCURSALES),
        ventas: db.collection::<Venta>(seed::VENTAS),
        clientes_nuevos: db.collection::<ContadorClientesNuevos>(seed::CLIENTES_NUEVOS),
        institucion: db.collection::<Institucion>(seed::INSTITUCION),
        estados_documento: db.collection::<EstadoDocumentoRow>(seed::ESTADO_DOCUMENTO),
        ventas_lock: Arc::new(Mutex::new(())),
        clientes_lock: Arc::new(Mutex::new(())),
        config,
        client,
    })
}
