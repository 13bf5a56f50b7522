use anyhow::Result;
use mongodb::bson::doc;

use super::AppState;

/// Stores the current period on the institution record. Returns false when
/// there is no institution record.
pub async fn update_institution_period(state: &AppState, mes: i32, anio: i32) -> Result<bool> {
    let Some(institucion) = state.institucion.find_one(doc! {}).await? else {
        return Ok(false);
    };
    let Some(id) = institucion.id else {
        return Ok(false);
    };
    state
        .institucion
        .update_one(doc! { "_id": id }, doc! { "$set": { "mes": mes, "anio": anio } })
        .await?;
    Ok(true)
}
