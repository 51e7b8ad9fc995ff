/*!
 * Storage Errors
 * Versioning and transaction failures for policy and content storage
 */

use miette::Diagnostic;
use thiserror::Error;
use uuid::Uuid;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage and transaction errors
#[derive(Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum StorageError {
    #[error("tag mismatch: update expects {expected} but storage is at {actual}")]
    #[diagnostic(
        code(storage::tag_mismatch),
        help("Storage moved on since the update was prepared. Re-read the current tag and retry.")
    )]
    TagMismatch { expected: Uuid, actual: Uuid },

    #[error("storage has no tag, incremental updates are not possible")]
    #[diagnostic(
        code(storage::missing_storage_tag),
        help("Upload a complete tagged document first.")
    )]
    MissingStorageTag,

    #[error("update has no {0} tag")]
    #[diagnostic(code(storage::missing_update_tag))]
    MissingUpdateTag(&'static str),

    #[error("no content {0:?}")]
    #[diagnostic(code(storage::missing_content))]
    MissingContent(String),

    #[error("path is empty")]
    #[diagnostic(code(storage::empty_path))]
    EmptyPath,

    #[error("path {path:?} does not lead to an existing node: {reason}")]
    #[diagnostic(code(storage::path_not_found))]
    PathNotFound { path: Vec<String>, reason: String },

    #[error("{entity} can't be added to {parent}")]
    #[diagnostic(code(storage::entity_mismatch))]
    EntityMismatch {
        entity: &'static str,
        parent: String,
    },

    #[error("{0} command requires an entity")]
    #[diagnostic(code(storage::missing_entity))]
    MissingEntity(&'static str),

    #[error("entity id {0:?} is already taken")]
    #[diagnostic(code(storage::duplicate_id))]
    DuplicateId(String),

    #[error("can't delete {child:?}: it is referenced by {parent:?}")]
    #[diagnostic(code(storage::referenced_child))]
    ReferencedChild { parent: String, child: String },

    #[error("invalid key {key:?} at {path:?}: {reason}")]
    #[diagnostic(code(storage::invalid_key))]
    InvalidKey {
        path: Vec<String>,
        key: String,
        reason: String,
    },

    #[error("modified node is invalid: {0}")]
    #[diagnostic(code(storage::invalid_node))]
    InvalidNode(String),

    #[error("transaction failed earlier: {0}")]
    #[diagnostic(
        code(storage::transaction_failed),
        help("A failed transaction can't be used anymore. Open a new one.")
    )]
    TransactionFailed(Box<StorageError>),
}

impl StorageError {
    /// True for optimistic-concurrency failures the caller can retry
    pub fn is_tag_error(&self) -> bool {
        match self {
            StorageError::TagMismatch { .. } | StorageError::MissingStorageTag => true,
            StorageError::TransactionFailed(inner) => inner.is_tag_error(),
            _ => false,
        }
    }
}
