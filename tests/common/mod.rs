#![allow(dead_code)]

use std::{
    env,
    sync::{Mutex, MutexGuard, OnceLock},
    time::{SystemTime, UNIX_EPOCH},
};

use chrono::{TimeZone, Utc};
use chrono_tz::America::Guayaquil;
use mongodb::{
    Client,
    bson::{DateTime, doc, oid::ObjectId},
};

use vanu::{
    config::{ClientesNuevosMode, Config},
    models::{Documento, EstadoDocumento},
    state::{AppState, init_state_with},
};

/// Global lock so integration tests that mutate the DB run one-at-a-time.
static TEST_DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub struct TestContext {
    pub state: AppState,
    pub db_name: String,
    _guard: MutexGuard<'static, ()>,
}

pub fn test_config(db_name: &str) -> Config {
    Config {
        mongodb_uri: env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
        mongodb_db: db_name.to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        timezone: Guayaquil,
        canal_excluido: "DS".to_string(),
        clientes_nuevos: ClientesNuevosMode::Snapshot,
        frecuente_min_pedidos: 3,
        // Transactions need a replica set; opt in with VANU_ATOMIC_WRITES=true.
        atomic_writes: env::var("VANU_ATOMIC_WRITES")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false),
        contifico_uri: None,
        contifico_token: None,
        servicli_uri: None,
        servicli_user: None,
        servicli_pass: None,
        sucursales_file: None,
    }
}

pub async fn setup_state() -> Option<TestContext> {
    setup_state_with(|_| {}).await
}

pub async fn setup_state_with(tweak: impl FnOnce(&mut Config)) -> Option<TestContext> {
    let guard = TEST_DB_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let db_name = format!(
        "vanutest_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis()
    );
    let mut config = test_config(&db_name);
    tweak(&mut config);

    let client = match Client::with_uri_str(&config.mongodb_uri).await {
        Ok(c) => c,
        Err(err) => {
            eprintln!("Skipping test; cannot connect to MongoDB: {err:?}");
            return None;
        }
    };
    if let Err(err) = client.database(&db_name).drop().await {
        eprintln!("Skipping test; cannot drop test DB: {err:?}");
        return None;
    }

    match init_state_with(config).await {
        Ok(state) => Some(TestContext {
            state,
            db_name,
            _guard: guard,
        }),
        Err(err) => {
            eprintln!("Skipping test; init_state failed: {err:?}");
            None
        }
    }
}

pub async fn teardown(ctx: TestContext) {
    let _ = ctx.state.client.database(&ctx.db_name).drop().await;
    drop(ctx);
}

/// Transactions need a replica set; a standalone server has no `setName`.
pub async fn supports_transactions(state: &AppState) -> bool {
    match state
        .client
        .database("admin")
        .run_command(doc! { "hello": 1 })
        .await
    {
        Ok(reply) => reply.contains_key("setName"),
        Err(_) => false,
    }
}

/// Noon local time on the given day.
pub fn local_noon(year: i32, month: u32, day: u32) -> DateTime {
    let at = Guayaquil
        .with_ymd_and_hms(year, month, day, 12, 0, 0)
        .unwrap()
        .with_timezone(&Utc);
    DateTime::from_chrono(at)
}

/// Minimal stored document: no client, no destination, no channel.
pub fn documento(numero: &str, emitido: DateTime, total: f64, costo_envio: f64) -> Documento {
    Documento {
        id: None,
        documento: numero.to_string(),
        estado: EstadoDocumento::Pendiente,
        url_ride: None,
        fecha_emision: emitido,
        fecha_creacion: emitido,
        total,
        costo_envio,
        descripcion: None,
        id_cliente: None,
        id_ciudad_destino: None,
        id_sucursal_destino: None,
        id_guia: None,
        url_guia_pdf: None,
        tipo_documento: "FAC".to_string(),
        canal_venta: None,
        usuario_comprador: None,
        forma_pago: None,
        otro_destinatario: None,
    }
}

pub fn with_channel(mut doc: Documento, canal: &str) -> Documento {
    doc.canal_venta = Some(canal.to_string());
    doc
}

pub fn with_client(mut doc: Documento, cliente: ObjectId) -> Documento {
    doc.id_cliente = Some(cliente);
    doc
}

pub fn with_city(mut doc: Documento, ciudad: ObjectId) -> Documento {
    doc.id_ciudad_destino = Some(ciudad);
    doc
}

pub fn with_branch(mut doc: Documento, sucursal: ObjectId) -> Documento {
    doc.id_sucursal_destino = Some(sucursal);
    doc
}
