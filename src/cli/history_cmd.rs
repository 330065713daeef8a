//! History and insights command handlers

use chrono::Local;

use crate::application::ports::{KeyValueStore, StorageError};
use crate::application::HistorySink;

use super::presenter::Presenter;

/// Show the newest `limit` records
pub async fn handle_history<S: KeyValueStore>(
    sink: &HistorySink<S>,
    limit: usize,
    json: bool,
    presenter: &Presenter,
) -> Result<(), StorageError> {
    let mut records = sink.list().await?;
    records.truncate(limit);

    if json {
        presenter.json(&records);
    } else {
        presenter.history(&records);
    }
    Ok(())
}

/// Show patterns across recent records
pub async fn handle_insights<S: KeyValueStore>(
    sink: &HistorySink<S>,
    json: bool,
    presenter: &Presenter,
) -> Result<(), StorageError> {
    let insights = sink.insights(Local::now()).await?;

    match (insights, json) {
        (insights, true) => presenter.json(&insights),
        (Some(insights), false) => presenter.insights(&insights),
        (None, false) => presenter.info("Not enough analyses yet. Run `crysense` to record one"),
    }
    Ok(())
}
