use thiserror::Error;

use crate::event::Envelope;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Sending message failed")]
    ActionSendFailed(#[from] tokio::sync::mpsc::error::SendError<Envelope>),
    #[error("Error aggregation")]
    Aggregate(Vec<AppError>),
    #[error("Component {0} has an unexpected kind")]
    ComponentMismatch(String),
    #[error("Component {0} is not defined")]
    ComponentNotDefined(String),
    #[error("Card configuration is invalid: {0}")]
    InvalidConfig(#[from] serde_json::Error),
    #[error("Task failed: {0}")]
    TaskFailed(String),
    #[error("Terminal not initialized")]
    TerminalNotInitialized,
    #[error("Terminal operation failed")]
    TerminalOperationFailed(#[from] std::io::Error),
}
