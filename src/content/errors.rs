/*!
 * Content Errors
 * Lookup and construction failures for local content
 */

use crate::value::{Kind, ValueError};
use miette::Diagnostic;
use thiserror::Error;

/// Result type for content operations
pub type ContentResult<T> = Result<T, ContentError>;

/// Content lookup and construction errors
#[derive(Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum ContentError {
    #[error("content storage is not available")]
    #[diagnostic(code(content::no_storage))]
    NoStorage,

    #[error("missing content {0:?}")]
    #[diagnostic(code(content::missing_content))]
    MissingContent(String),

    #[error("missing content item {item:?} in {content:?}")]
    #[diagnostic(code(content::missing_item))]
    MissingItem { content: String, item: String },

    #[error("item expects {expected} keys, got {actual}")]
    #[diagnostic(code(content::invalid_path_length))]
    InvalidPathLength { expected: usize, actual: usize },

    #[error("{actual} can't be used as a {expected} key")]
    #[diagnostic(code(content::invalid_key_kind))]
    InvalidKeyKind { expected: Kind, actual: Kind },

    #[error("no value for key {0}")]
    #[diagnostic(code(content::key_not_found))]
    KeyNotFound(String),

    #[error("{0} keys are not supported")]
    #[diagnostic(
        code(content::unsupported_key),
        help("Content keys can be string, address, network or domain.")
    )]
    UnsupportedKey(Kind),

    #[error("invalid content item: {0}")]
    #[diagnostic(code(content::invalid_item))]
    InvalidItem(String),

    #[error("invalid key: {0}")]
    #[diagnostic(code(content::invalid_key))]
    InvalidKey(#[from] ValueError),
}
