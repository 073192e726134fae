//! Error types for the editor

use crate::widget::WidgetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Widget error: {0}")]
    Widget(#[from] WidgetError),

    #[error("Document error: {0}")]
    Document(#[from] tabula_document::DocumentError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No spreadsheet node with id {0}")]
    NodeNotFound(String),

    #[error("Node at {0:?} is not a spreadsheet")]
    NotAWidget(Vec<usize>),

    #[error("Spreadsheet {0} already has a mounted view")]
    AlreadyBound(String),

    #[error("Document state lock poisoned")]
    Poisoned,

    #[error("Node view task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Store error: {0}")]
    Store(String),
}

impl<T> From<std::sync::PoisonError<T>> for EditorError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        EditorError::Poisoned
    }
}
