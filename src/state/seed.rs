use anyhow::Result;
use mongodb::{
    Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};

use crate::models::{EstadoDocumento, EstadoDocumentoRow};

pub(super) const DOCUMENTOS: &str = "documentos";
pub(super) const CLIENTES: &str = "clientes";
pub(super) const CIUDADES: &str = "ciudades";
pub(super) const SUCURSALES: &str = "sucursales";
pub(super) const VENTAS: &str = "ventas";
pub(super) const CLIENTES_NUEVOS: &str = "clientes_nuevos";
pub(super) const INSTITUCION: &str = "institution";
pub(super) const ESTADO_DOCUMENTO: &str = "estado_documento";
pub(super) const DETALLES_PRODUCTOS: &str = "detalles_productos";

const COLLECTIONS: [&str; 9] = [
    DOCUMENTOS,
    CLIENTES,
    CIUDADES,
    SUCURSALES,
    VENTAS,
    CLIENTES_NUEVOS,
    INSTITUCION,
    ESTADO_DOCUMENTO,
    DETALLES_PRODUCTOS,
];

pub(super) async fn ensure_collections(db: &Database) -> Result<()> {
    let existing = db.list_collection_names().await?;
    for name in COLLECTIONS {
        if !existing.iter().any(|n| n == name) {
            db.create_collection(name).await?;
        }
    }
    Ok(())
}

async fn unique_index(db: &Database, collection: &str, keys: Document, name: &str) -> Result<()> {
    db.collection::<Document>(collection)
        .create_index(
            IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name(name.to_string())
                        .build(),
                )
                .build(),
        )
        .await?;
    Ok(())
}

async fn plain_index(db: &Database, collection: &str, keys: Document, name: &str) -> Result<()> {
    db.collection::<Document>(collection)
        .create_index(
            IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().name(name.to_string()).build())
                .build(),
        )
        .await?;
    Ok(())
}

/// One bucket per `(mes, anio)`, one document per Contifico number, one
/// client per persona id, one counter per `(mes, anio)`.
pub(super) async fn ensure_indexes(db: &Database) -> Result<()> {
    unique_index(db, VENTAS, doc! { "mes": 1, "anio": 1 }, "mes_anio_unique").await?;
    unique_index(
        db,
        CLIENTES_NUEVOS,
        doc! { "mes": 1, "anio": 1 },
        "mes_anio_unique",
    )
    .await?;
    unique_index(db, DOCUMENTOS, doc! { "documento": 1 }, "documento_unique").await?;
    unique_index(db, CLIENTES, doc! { "personaId": 1 }, "persona_unique").await?;

    plain_index(db, DOCUMENTOS, doc! { "fechaEmision": 1 }, "fecha_emision").await?;
    plain_index(db, DETALLES_PRODUCTOS, doc! { "idDocumento": 1 }, "id_documento").await?;
    Ok(())
}

/// Inserts the four document states when the catalog is empty.
pub(super) async fn seed_document_states(db: &Database) -> Result<()> {
    let coll = db.collection::<EstadoDocumentoRow>(ESTADO_DOCUMENTO);
    if coll.estimated_document_count().await? > 0 {
        tracing::debug!("document states already seeded");
        return Ok(());
    }

    let rows = EstadoDocumento::ALL.iter().map(|estado| EstadoDocumentoRow {
        id: None,
        nombre: estado.as_str().to_string(),
        estado_number: estado.number(),
    });
    coll.insert_many(rows).await?;
    tracing::info!("document states seeded");
    Ok(())
}
