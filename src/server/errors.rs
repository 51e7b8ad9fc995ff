/*!
 * Server Errors
 * Staging, upload and apply failures
 */

use crate::document::DocumentError;
use crate::storage::StorageError;
use crate::wire::WireError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// Control-plane and decision entry point errors
#[derive(Error, Debug, Diagnostic)]
pub enum ServerError {
    #[error("staging queue is full ({capacity} items)")]
    #[diagnostic(
        code(server::queue_overflow),
        help("Apply or abort staged items before staging more.")
    )]
    QueueOverflow { capacity: usize },

    #[error("no staged item with id {0}")]
    #[diagnostic(code(server::unknown_staged_id))]
    UnknownStagedId(u32),

    #[error("staged item {id} exceeds the upload limit of {limit} bytes")]
    #[diagnostic(
        code(server::upload_too_large),
        help("The item was discarded. Raise PDP_MAX_UPLOAD_BYTES or split the update.")
    )]
    UploadTooLarge { id: u32, limit: usize },

    #[error("upload of staged item {id} aborted: {reason}")]
    #[diagnostic(code(server::upload_aborted))]
    UploadAborted { id: u32, reason: String },

    #[error("staged item {id}: {reason}")]
    #[diagnostic(code(server::invalid_state))]
    InvalidState { id: u32, reason: &'static str },

    #[error("staged for content {staged:?} but the document is content {document:?}")]
    #[diagnostic(code(server::content_id_mismatch))]
    ContentIdMismatch { staged: String, document: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Wire(#[from] WireError),
}

impl ServerError {
    /// True when the update was prepared against a tag that is no longer current
    pub fn is_tag_mismatch(&self) -> bool {
        matches!(self, ServerError::Storage(err) if err.is_tag_error())
    }

    /// Stable machine-readable code for control-plane responses
    pub fn code(&self) -> &'static str {
        match self {
            _ if self.is_tag_mismatch() => "tag_mismatch",
            ServerError::QueueOverflow { .. } => "queue_overflow",
            ServerError::UnknownStagedId(_) => "unknown_staged_id",
            ServerError::UploadTooLarge { .. } => "upload_too_large",
            ServerError::UploadAborted { .. } => "upload_aborted",
            ServerError::InvalidState { .. } => "invalid_state",
            ServerError::ContentIdMismatch { .. } | ServerError::Document(_) => "invalid_document",
            ServerError::Storage(_) => "storage",
            ServerError::Wire(_) => "invalid_request",
        }
    }
}
