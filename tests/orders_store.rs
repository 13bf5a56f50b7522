#[path = "common/mod.rs"]
mod common;

use std::collections::HashMap;

use chrono::Utc;
use mongodb::bson::{doc, oid::ObjectId};

use common::{documento, local_noon, with_client};
use vanu::{
    catalog::{SucursalSeed, name_cities, seed_branches},
    contifico::{ContificoDetalle, ContificoDocument, ContificoPersona},
    documents::{IncomingDetalle, ingest, persist_order},
    models::{Ciudad, Cliente},
    state::{
        AppState, find_city_by_code, find_document_by_numero, get_client_by_id, insert_client,
        list_details, new_client_counter,
    },
    ventas::BucketKey,
};

fn detalle(producto: &str, precio: f64) -> IncomingDetalle {
    IncomingDetalle {
        id_producto: Some(producto.to_string()),
        nombre: Some(format!("Producto {producto}")),
        precio,
        cantidad: 1.0,
        porcentaje_descuento: 0.0,
        porcentaje_iva: 12.0,
    }
}

fn cliente(persona: &str) -> Cliente {
    Cliente {
        id: None,
        persona_id: persona.to_string(),
        tipo_id: Some("CEDULA".into()),
        razon_social: None,
        telefonos: Vec::new(),
        direccion: None,
        tipo: None,
        email: None,
        fecha_creacion: None,
        total: 0,
        total_money: 0.0,
        total_mes: 0,
        total_money_mes: 0.0,
        nuevo: true,
        frecuente: false,
    }
}

async fn assert_order_left_nothing(state: &AppState, numero: &str) {
    assert!(find_document_by_numero(state, numero).await.unwrap().is_none());
    assert_eq!(state.detalles.count_documents(doc! {}).await.unwrap(), 0);
    assert_eq!(state.clientes_nuevos.count_documents(doc! {}).await.unwrap(), 0);
}

#[tokio::test]
async fn failed_count_leaves_no_document_behind() {
    let Some(ctx) = common::setup_state().await else {
        return;
    };
    let state = ctx.state.clone();
    let missing_client = ObjectId::new();
    let doc = with_client(documento("F-1", local_noon(2024, 5, 3), 20.0, 0.0), missing_client);

    let res = persist_order(&state, &doc, &[detalle("P1", 10.0), detalle("P2", 10.0)]).await;
    assert!(res.is_err());
    assert_order_left_nothing(&state, "F-1").await;

    common::teardown(ctx).await;
}

#[tokio::test]
async fn failed_order_is_counted_when_retried() {
    let Some(ctx) = common::setup_state().await else {
        return;
    };
    let state = ctx.state.clone();
    let cliente_id = ObjectId::new();
    let doc = with_client(documento("F-1", local_noon(2024, 5, 3), 20.0, 0.0), cliente_id);

    assert!(persist_order(&state, &doc, &[]).await.is_err());

    let mut stored = cliente("0911111111");
    stored.id = Some(cliente_id);
    insert_client(&state, &stored).await.unwrap();

    persist_order(&state, &doc, &[detalle("P1", 20.0)]).await.unwrap();

    let stored = get_client_by_id(&state, &cliente_id).await.unwrap().unwrap();
    assert_eq!(stored.total, 1);
    assert_eq!(stored.total_money, 20.0);
    for key in BucketKey::targets(5, 2024) {
        assert_eq!(new_client_counter(&state, key).await.unwrap(), 1);
    }

    common::teardown(ctx).await;
}

#[tokio::test]
async fn failed_count_rolls_back_the_transaction() {
    let Some(ctx) = common::setup_state_with(|c| c.atomic_writes = true).await else {
        return;
    };
    let state = ctx.state.clone();
    if !common::supports_transactions(&state).await {
        eprintln!("Skipping test; MongoDB is not a replica set");
        common::teardown(ctx).await;
        return;
    }
    let doc = with_client(documento("F-9", local_noon(2024, 5, 3), 20.0, 0.0), ObjectId::new());

    assert!(persist_order(&state, &doc, &[detalle("P1", 20.0)]).await.is_err());
    assert_order_left_nothing(&state, "F-9").await;

    common::teardown(ctx).await;
}

fn raw_doc(numero: &str, detalles: Vec<ContificoDetalle>) -> ContificoDocument {
    ContificoDocument {
        documento: Some(numero.into()),
        tipo_documento: Some("PRE".into()),
        fecha_emision: Some("10/05/2024".into()),
        total: Some("25".into()),
        persona: Some(ContificoPersona {
            cedula: Some("0977777777".into()),
            ..Default::default()
        }),
        detalles: Some(detalles),
        ..Default::default()
    }
}

fn raw_detalle(producto: &str, precio: &str) -> ContificoDetalle {
    ContificoDetalle {
        producto_id: Some(producto.into()),
        producto_nombre: Some(format!("Producto {producto}")),
        cantidad: Some("1".into()),
        precio: Some(precio.into()),
        porcentaje_descuento: Some("0".into()),
        porcentaje_iva: Some("12".into()),
    }
}

#[tokio::test]
async fn detail_lines_are_stored_once() {
    let Some(ctx) = common::setup_state().await else {
        return;
    };
    let state = ctx.state.clone();
    let batch = vec![raw_doc(
        "PRE-1",
        vec![raw_detalle("P1", "10.00"), raw_detalle("P2", "15.00")],
    )];

    let first = ingest(&state, &batch, Utc::now()).await.unwrap();
    assert_eq!(first.guardados, 1);
    assert_eq!(first.detalles, 2);

    // Re-ingesting the same document adds only lines not seen before.
    let mut with_extra = batch.clone();
    with_extra[0]
        .detalles
        .as_mut()
        .unwrap()
        .push(raw_detalle("P3", "5.00"));
    let second = ingest(&state, &with_extra, Utc::now()).await.unwrap();
    assert_eq!(second.existentes, 1);
    assert_eq!(second.detalles, 1);

    let stored = find_document_by_numero(&state, "PRE-1").await.unwrap().unwrap();
    let lines = list_details(&state, &stored.id.unwrap()).await.unwrap();
    assert_eq!(lines.len(), 3);
    let p2 = lines
        .iter()
        .find(|l| l.id_producto.as_deref() == Some("P2"))
        .unwrap();
    assert_eq!(p2.precio, 15.0);
    assert_eq!(p2.porcentaje_iva, 12.0);

    common::teardown(ctx).await;
}

#[tokio::test]
async fn branches_seed_once_and_cities_get_names() {
    let Some(ctx) = common::setup_state().await else {
        return;
    };
    let state = ctx.state.clone();
    state
        .ciudades
        .insert_one(Ciudad { id: None, codigo: Some(17), nombre: Some("Quito".into()) })
        .await
        .unwrap();
    let seeds = vec![
        SucursalSeed {
            id: Some("1".into()),
            id_ciudad: Some("17".into()),
            direccion: Some("Av. Amazonas".into()),
            ..Default::default()
        },
        SucursalSeed {
            id: Some("2".into()),
            id_ciudad: Some("5".into()),
            ..Default::default()
        },
        SucursalSeed {
            id: Some("3".into()),
            id_ciudad: Some("6".into()),
            ..Default::default()
        },
    ];

    let report = seed_branches(&state, &seeds).await.unwrap();
    assert_eq!(report.sucursales, 3);
    assert_eq!(report.ciudades_creadas, 2);
    assert_eq!(seed_branches(&state, &seeds).await.unwrap().sucursales, 0);
    assert_eq!(state.sucursales.count_documents(doc! {}).await.unwrap(), 3);

    let catalogo = HashMap::from([(5, "Cuenca".to_string())]);
    assert_eq!(name_cities(&state, &catalogo).await.unwrap(), 2);

    let nombre = |codigo| {
        let state = state.clone();
        async move { find_city_by_code(&state, codigo).await.unwrap().unwrap().nombre }
    };
    assert_eq!(nombre(17).await.as_deref(), Some("Quito"));
    assert_eq!(nombre(5).await.as_deref(), Some("Cuenca"));
    assert_eq!(nombre(6).await.as_deref(), Some("6"));

    common::teardown(ctx).await;
}
