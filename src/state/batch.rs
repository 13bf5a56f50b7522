use anyhow::{Context, Result};
use mongodb::ClientSession;

use super::AppState;

/// Opens a transaction when atomic writes are enabled. `None` means the
/// writes of the batch go out one by one.
pub async fn begin_batch(state: &AppState) -> Result<Option<ClientSession>> {
    if !state.config.atomic_writes {
        return Ok(None);
    }
    let mut session = state.client.start_session().await?;
    session
        .start_transaction()
        .await
        .context("starting transaction")?;
    Ok(Some(session))
}

/// Commits when the batch succeeded and aborts otherwise. The batch result
/// is passed through.
pub async fn finish_batch<T>(session: Option<ClientSession>, result: Result<T>) -> Result<T> {
    let Some(mut session) = session else {
        return result;
    };
    match result {
        Ok(value) => {
            session
                .commit_transaction()
                .await
                .context("committing transaction")?;
            Ok(value)
        }
        Err(err) => {
            if let Err(abort_err) = session.abort_transaction().await {
                tracing::warn!(error = %abort_err, "transaction abort failed");
            }
            Err(err)
        }
    }
}
