#[path = "common/mod.rs"]
mod common;

use chrono_tz::America::Guayaquil;
use mongodb::bson::oid::ObjectId;

use common::{documento, local_noon, with_branch, with_channel, with_city, with_client};
use vanu::{
    models::{CanalVenta, Destino, TipoEnvioTotal},
    ventas::{Aggregation, BucketKey, TipoEnvio},
};

fn aggregate(docs: &[(vanu::models::Documento, Option<&str>)]) -> Aggregation {
    let mut aggregation = Aggregation::new("DS", Guayaquil);
    for (doc, destino) in docs {
        aggregation.add(doc, *destino);
    }
    aggregation
}

#[test]
fn march_example_excludes_direct_sales_from_revenue() {
    let quito = ObjectId::new();
    let web = with_city(
        with_channel(documento("F-1", local_noon(2024, 3, 4), 100.0, 5.0), "WEB"),
        quito,
    );
    let ds = with_city(
        with_channel(documento("F-2", local_noon(2024, 3, 18), 50.0, 0.0), "DS"),
        quito,
    );

    let aggregation = aggregate(&[(web, Some("Quito")), (ds, Some("Quito"))]);
    let marzo = aggregation.get(&BucketKey::new(3, 2024)).unwrap();

    assert_eq!(marzo.pedidos, 2);
    assert_eq!(marzo.total_ventas, 100.0);
    assert_eq!(marzo.total_envios, 5.0);
    assert_eq!(marzo.ventas_envios, 105.0);
    assert_eq!(marzo.envios, 1);
    assert_eq!(
        marzo.canales_venta,
        vec![
            CanalVenta {
                canal: "WEB".into(),
                total: 1,
                total_money: 100.0
            },
            CanalVenta {
                canal: "DS".into(),
                total: 1,
                total_money: 50.0
            },
        ]
    );
    assert_eq!(
        marzo.principales_destinos,
        vec![Destino {
            destino: "Quito".into(),
            total: 2
        }]
    );
}

#[test]
fn excluded_channel_shipping_stays_out_of_revenue() {
    let ds = with_channel(documento("F-1", local_noon(2024, 4, 9), 50.0, 7.0), "DS");

    let aggregation = aggregate(&[(ds, None)]);
    for key in BucketKey::targets(4, 2024) {
        let bucket = aggregation.get(&key).unwrap();
        assert_eq!(bucket.pedidos, 1);
        assert_eq!(bucket.total_ventas, 0.0);
        assert_eq!(bucket.total_envios, 0.0);
        assert_eq!(bucket.ventas_envios, 0.0);
        assert_eq!(bucket.envios, 0);
        assert_eq!(
            bucket.canales_venta,
            vec![CanalVenta { canal: "DS".into(), total: 1, total_money: 50.0 }]
        );
    }
}

#[test]
fn every_document_lands_in_month_year_and_consolidated() {
    let docs = vec![
        (documento("F-1", local_noon(2024, 1, 10), 10.0, 0.0), None),
        (documento("F-2", local_noon(2024, 2, 10), 20.0, 0.0), None),
        (documento("F-3", local_noon(2024, 2, 11), 30.0, 0.0), None),
    ];
    let aggregation = aggregate(&docs);

    assert_eq!(aggregation.len(), 4);
    assert_eq!(aggregation.get(&BucketKey::new(1, 2024)).unwrap().pedidos, 1);
    assert_eq!(aggregation.get(&BucketKey::new(2, 2024)).unwrap().pedidos, 2);
    assert_eq!(aggregation.get(&BucketKey::anual(2024)).unwrap().pedidos, 3);
    let consolidado = aggregation.get(&BucketKey::CONSOLIDADO).unwrap();
    assert_eq!(consolidado.pedidos, 3);
    assert_eq!(consolidado.total_ventas, 60.0);
}

#[test]
fn clients_are_counted_once_per_bucket() {
    let ana = ObjectId::new();
    let luis = ObjectId::new();
    let docs = vec![
        (with_client(documento("F-1", local_noon(2024, 5, 1), 1.0, 0.0), ana), None),
        (with_client(documento("F-2", local_noon(2024, 5, 2), 1.0, 0.0), ana), None),
        (with_client(documento("F-3", local_noon(2024, 6, 2), 1.0, 0.0), ana), None),
        (with_client(documento("F-4", local_noon(2024, 6, 3), 1.0, 0.0), luis), None),
        (documento("F-5", local_noon(2024, 6, 4), 1.0, 0.0), None),
    ];
    let aggregation = aggregate(&docs);

    assert_eq!(aggregation.get(&BucketKey::new(5, 2024)).unwrap().clientes_atendidos, 1);
    assert_eq!(aggregation.get(&BucketKey::new(6, 2024)).unwrap().clientes_atendidos, 2);
    assert_eq!(aggregation.get(&BucketKey::anual(2024)).unwrap().clientes_atendidos, 2);
    assert_eq!(aggregation.get(&BucketKey::new(6, 2024)).unwrap().pedidos, 3);
}

#[test]
fn delivery_type_prefers_branch_then_city() {
    let ciudad = ObjectId::new();
    let sucursal = ObjectId::new();
    let agencia = with_branch(with_city(documento("F-1", local_noon(2024, 7, 1), 1.0, 0.0), ciudad), sucursal);
    let domicilio = with_city(documento("F-2", local_noon(2024, 7, 1), 1.0, 0.0), ciudad);
    let desconocido = documento("F-3", local_noon(2024, 7, 1), 1.0, 0.0);

    assert_eq!(TipoEnvio::classify(&agencia), TipoEnvio::Agencia);
    assert_eq!(TipoEnvio::classify(&domicilio), TipoEnvio::Domicilio);
    assert_eq!(TipoEnvio::classify(&desconocido), TipoEnvio::Desconocido);

    let aggregation = aggregate(&[
        (agencia, Some("Guayaquil")),
        (domicilio, Some("Guayaquil")),
        (desconocido, None),
    ]);
    let julio = aggregation.get(&BucketKey::new(7, 2024)).unwrap();
    assert_eq!(
        julio.tipos_envio(),
        vec![
            TipoEnvioTotal { tipo: "Retiro en agencia".into(), total: 1 },
            TipoEnvioTotal { tipo: "Envios a domicilio".into(), total: 1 },
            TipoEnvioTotal { tipo: "Desconocido".into(), total: 1 },
        ]
    );
    // Only documents with a city show up among the destinations.
    assert_eq!(
        julio.principales_destinos,
        vec![Destino { destino: "Guayaquil".into(), total: 2 }]
    );
}

#[test]
fn unnamed_city_and_missing_channel_fall_back_to_unknown() {
    let ciudad = ObjectId::new();
    let doc = with_city(documento("F-1", local_noon(2024, 8, 1), 12.0, 0.0), ciudad);
    let blank_channel = with_channel(documento("F-2", local_noon(2024, 8, 2), 8.0, 0.0), "  ");

    let aggregation = aggregate(&[(doc, None), (blank_channel, None)]);
    let agosto = aggregation.get(&BucketKey::new(8, 2024)).unwrap();

    assert_eq!(
        agosto.principales_destinos,
        vec![Destino { destino: "Desconocido".into(), total: 1 }]
    );
    assert_eq!(
        agosto.canales_venta,
        vec![CanalVenta { canal: "Desconocido".into(), total: 2, total_money: 20.0 }]
    );
    // Unknown channel is not the excluded one, so it counts as revenue.
    assert_eq!(agosto.total_ventas, 20.0);
}

#[test]
fn emission_month_follows_local_time() {
    // 23:30 on March 31 in Guayaquil is already April in UTC.
    let at = chrono::TimeZone::with_ymd_and_hms(&Guayaquil, 2024, 3, 31, 23, 30, 0)
        .unwrap()
        .with_timezone(&chrono::Utc);
    let doc = documento("F-1", mongodb::bson::DateTime::from_chrono(at), 1.0, 0.0);

    let aggregation = aggregate(&[(doc, None)]);
    assert!(aggregation.get(&BucketKey::new(3, 2024)).is_some());
    assert!(aggregation.get(&BucketKey::new(4, 2024)).is_none());
}

#[test]
fn aggregating_the_same_documents_twice_gives_the_same_buckets() {
    let cliente = ObjectId::new();
    let docs = vec![
        (with_client(with_channel(documento("F-1", local_noon(2024, 9, 1), 40.0, 3.0), "WEB"), cliente), None),
        (with_client(with_channel(documento("F-2", local_noon(2024, 9, 9), 15.0, 0.0), "DS"), cliente), None),
    ];

    let first: Vec<_> = aggregate(&docs).into_buckets().collect();
    let second: Vec<_> = aggregate(&docs).into_buckets().collect();
    assert_eq!(first, second);
}

#[test]
fn bucket_becomes_labelled_record() {
    let doc = with_channel(documento("F-1", local_noon(2024, 3, 1), 10.0, 2.0), "WEB");
    let aggregation = aggregate(&[(doc, None)]);

    let ventas: Vec<_> = aggregation
        .into_buckets()
        .map(|(key, totals)| totals.into_venta(key, 7))
        .collect();

    let labels: Vec<_> = ventas.iter().map(|v| v.mes_label.as_str()).collect();
    assert_eq!(labels, vec!["Consolidado", "Anual", "Marzo"]);
    assert!(ventas.iter().all(|v| v.clientes_nuevos == 7));
    assert!(ventas.iter().all(|v| v.tipos_envio.len() == 3));
}
