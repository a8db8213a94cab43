use std::sync::Arc;

use lockhist_host::{protocol::HISTORY_REQUEST_TYPE, CallDispatch, HostError};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::model::HistoryList;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Calling history failed: {0}")]
    Channel(#[from] HostError),
    #[error("History response is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct HistoryResponse {
    history: HistoryList,
}

/// Fetches the lock history over the host's call dispatch.
///
/// Every call issues exactly one request. Nothing is cached or retried.
pub struct HistoryClient<D: ?Sized> {
    dispatch: Arc<D>,
}

impl<D: CallDispatch + ?Sized> HistoryClient<D> {
    pub fn new(dispatch: Arc<D>) -> Self {
        Self { dispatch }
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_history(&self) -> Result<HistoryList, ClientError> {
        let response = self
            .dispatch
            .call(json!({ "type": HISTORY_REQUEST_TYPE }))
            .await?;

        let response: HistoryResponse = serde_json::from_value(response)?;

        tracing::debug!("fetched {} history entries", response.history.len());

        Ok(response.history)
    }
}
