/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::content::ContentError;
pub use crate::document::DocumentError;
pub use crate::expr::{BuildError, EvalError};
pub use crate::server::ServerError;
pub use crate::storage::StorageError;
pub use crate::value::ValueError;
pub use crate::wire::WireError;

/// Unified error type with miette diagnostics
#[derive(Error, Debug)]
pub enum PdpError {
    #[error("Value error: {0}")]
    // diagnostic(transparent)
    Value(#[from] ValueError),

    #[error("Evaluation error: {0}")]
    // diagnostic(transparent)
    Eval(#[from] EvalError),

    #[error("Build error: {0}")]
    // diagnostic(transparent)
    Build(#[from] BuildError),

    #[error("Content error: {0}")]
    // diagnostic(transparent)
    Content(#[from] ContentError),

    #[error("Storage error: {0}")]
    // diagnostic(transparent)
    Storage(#[from] StorageError),

    #[error("Wire error: {0}")]
    // diagnostic(transparent)
    Wire(#[from] WireError),

    #[error("Document error: {0}")]
    // diagnostic(transparent)
    Document(#[from] DocumentError),

    #[error("Server error: {0}")]
    // diagnostic(transparent)
    Server(#[from] ServerError),

    #[error("I/O error: {0}")]
    // diagnostic(
    //     code(pdp::io_error),
    //     help("Filesystem or stream operation failed. Check paths and permissions.")
    // )
    Io(#[from] std::io::Error),
}

// Equivalent of `#[derive(Diagnostic)]` with the attributes above. Written out by
// hand because the derive forwards via `inner.code()`, which resolves to the
// inherent `ServerError::code` instead of `Diagnostic::code`.
impl Diagnostic for PdpError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            PdpError::Value(inner) => Diagnostic::code(inner),
            PdpError::Eval(inner) => Diagnostic::code(inner),
            PdpError::Build(inner) => Diagnostic::code(inner),
            PdpError::Content(inner) => Diagnostic::code(inner),
            PdpError::Storage(inner) => Diagnostic::code(inner),
            PdpError::Wire(inner) => Diagnostic::code(inner),
            PdpError::Document(inner) => Diagnostic::code(inner),
            PdpError::Server(inner) => Diagnostic::code(inner),
            PdpError::Io(_) => Some(Box::new("pdp::io_error")),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            PdpError::Value(inner) => Diagnostic::help(inner),
            PdpError::Eval(inner) => Diagnostic::help(inner),
            PdpError::Build(inner) => Diagnostic::help(inner),
            PdpError::Content(inner) => Diagnostic::help(inner),
            PdpError::Storage(inner) => Diagnostic::help(inner),
            PdpError::Wire(inner) => Diagnostic::help(inner),
            PdpError::Document(inner) => Diagnostic::help(inner),
            PdpError::Server(inner) => Diagnostic::help(inner),
            PdpError::Io(_) => Some(Box::new(
                "Filesystem or stream operation failed. Check paths and permissions.",
            )),
        }
    }

    fn url<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            PdpError::Value(inner) => Diagnostic::url(inner),
            PdpError::Eval(inner) => Diagnostic::url(inner),
            PdpError::Build(inner) => Diagnostic::url(inner),
            PdpError::Content(inner) => Diagnostic::url(inner),
            PdpError::Storage(inner) => Diagnostic::url(inner),
            PdpError::Wire(inner) => Diagnostic::url(inner),
            PdpError::Document(inner) => Diagnostic::url(inner),
            PdpError::Server(inner) => Diagnostic::url(inner),
            PdpError::Io(_) => None,
        }
    }

    fn severity(&self) -> Option<miette::Severity> {
        match self {
            PdpError::Value(inner) => Diagnostic::severity(inner),
            PdpError::Eval(inner) => Diagnostic::severity(inner),
            PdpError::Build(inner) => Diagnostic::severity(inner),
            PdpError::Content(inner) => Diagnostic::severity(inner),
            PdpError::Storage(inner) => Diagnostic::severity(inner),
            PdpError::Wire(inner) => Diagnostic::severity(inner),
            PdpError::Document(inner) => Diagnostic::severity(inner),
            PdpError::Server(inner) => Diagnostic::severity(inner),
            PdpError::Io(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        match self {
            PdpError::Value(inner) => Diagnostic::labels(inner),
            PdpError::Eval(inner) => Diagnostic::labels(inner),
            PdpError::Build(inner) => Diagnostic::labels(inner),
            PdpError::Content(inner) => Diagnostic::labels(inner),
            PdpError::Storage(inner) => Diagnostic::labels(inner),
            PdpError::Wire(inner) => Diagnostic::labels(inner),
            PdpError::Document(inner) => Diagnostic::labels(inner),
            PdpError::Server(inner) => Diagnostic::labels(inner),
            PdpError::Io(_) => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            PdpError::Value(inner) => Diagnostic::source_code(inner),
            PdpError::Eval(inner) => Diagnostic::source_code(inner),
            PdpError::Build(inner) => Diagnostic::source_code(inner),
            PdpError::Content(inner) => Diagnostic::source_code(inner),
            PdpError::Storage(inner) => Diagnostic::source_code(inner),
            PdpError::Wire(inner) => Diagnostic::source_code(inner),
            PdpError::Document(inner) => Diagnostic::source_code(inner),
            PdpError::Server(inner) => Diagnostic::source_code(inner),
            PdpError::Io(_) => None,
        }
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        match self {
            PdpError::Value(inner) => Diagnostic::related(inner),
            PdpError::Eval(inner) => Diagnostic::related(inner),
            PdpError::Build(inner) => Diagnostic::related(inner),
            PdpError::Content(inner) => Diagnostic::related(inner),
            PdpError::Storage(inner) => Diagnostic::related(inner),
            PdpError::Wire(inner) => Diagnostic::related(inner),
            PdpError::Document(inner) => Diagnostic::related(inner),
            PdpError::Server(inner) => Diagnostic::related(inner),
            PdpError::Io(_) => None,
        }
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        match self {
            PdpError::Value(inner) => Diagnostic::diagnostic_source(inner),
            PdpError::Eval(inner) => Diagnostic::diagnostic_source(inner),
            PdpError::Build(inner) => Diagnostic::diagnostic_source(inner),
            PdpError::Content(inner) => Diagnostic::diagnostic_source(inner),
            PdpError::Storage(inner) => Diagnostic::diagnostic_source(inner),
            PdpError::Wire(inner) => Diagnostic::diagnostic_source(inner),
            PdpError::Document(inner) => Diagnostic::diagnostic_source(inner),
            PdpError::Server(inner) => Diagnostic::diagnostic_source(inner),
            PdpError::Io(_) => None,
        }
    }
}

impl PdpError {
    /// Stable error type name for control-plane responses
    pub fn error_type(&self) -> &'static str {
        match self {
            PdpError::Value(_) => "value_error",
            PdpError::Eval(_) => "evaluation_error",
            PdpError::Build(_) => "build_error",
            PdpError::Content(_) => "content_error",
            PdpError::Storage(err) if err.is_tag_error() => "tag_mismatch",
            PdpError::Storage(_) => "storage_error",
            PdpError::Wire(_) => "wire_error",
            PdpError::Document(_) => "invalid_document",
            PdpError::Server(err) => err.code(),
            PdpError::Io(_) => "io_error",
        }
    }
}

/// Serializable error representation for control-plane responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SerializableError {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SerializableError {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_type: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

impl From<PdpError> for SerializableError {
    fn from(err: PdpError) -> Self {
        let error_type = err.error_type();
        match err.help() {
            Some(help) => {
                let help = help.to_string();
                SerializableError::with_details(error_type, err.to_string(), help)
            }
            None => SerializableError::new(error_type, err.to_string()),
        }
    }
}

impl From<ServerError> for SerializableError {
    fn from(err: ServerError) -> Self {
        PdpError::from(err).into()
    }
}

/// Result type for engine-wide operations
pub type Result<T> = std::result::Result<T, PdpError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_serializable_error_creation() {
        let error = SerializableError::new("test_error", "test message");
        assert_eq!(error.error_type, "test_error");
        assert_eq!(error.message, "test message");
        assert_eq!(error.details, None);
    }

    #[test]
    fn test_serializable_error_roundtrip() {
        let error = SerializableError::with_details("test_error", "test message", "extra info");
        let json = serde_json::to_string(&error).unwrap();
        let deserialized: SerializableError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, deserialized);
    }

    #[test]
    fn test_tag_mismatch_is_distinguishable() {
        let err: PdpError = StorageError::TagMismatch {
            expected: Uuid::new_v4(),
            actual: Uuid::new_v4(),
        }
        .into();
        let serializable = SerializableError::from(err);
        assert_eq!(serializable.error_type, "tag_mismatch");
        assert!(serializable.details.unwrap().contains("Re-read the current tag"));

        let server = ServerError::Storage(StorageError::MissingStorageTag);
        assert_eq!(SerializableError::from(server).error_type, "tag_mismatch");
    }

    #[test]
    fn test_server_codes_pass_through() {
        let serializable = SerializableError::from(ServerError::UnknownStagedId(9));
        assert_eq!(serializable.error_type, "unknown_staged_id");
        assert_eq!(serializable.message, "Server error: no staged item with id 9");
        assert_eq!(serializable.details, None);
    }

    #[test]
    fn test_io_error_display() {
        let err: PdpError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.to_string(), "I/O error: gone");
        assert_eq!(err.error_type(), "io_error");
    }
}
