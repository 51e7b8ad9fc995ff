/*!
 * Document Errors
 * Syntax and build failures located by their path inside the document
 */

use crate::content::ContentError;
use crate::expr::BuildError;
use crate::value::ValueError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for document loading
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Document loading errors
///
/// Paths name the failing element the way it is nested in the document,
/// e.g. `policies/root/rules/deny-all/condition`.
#[derive(Error, Debug, Diagnostic)]
pub enum DocumentError {
    #[error("malformed document: {0}")]
    #[diagnostic(code(document::syntax))]
    Syntax(#[from] serde_json::Error),

    #[error("can't read {path}: {source}")]
    #[diagnostic(code(document::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    #[diagnostic(code(document::build))]
    Build {
        path: String,
        #[source]
        source: BuildError,
    },

    #[error("{path}: {source}")]
    #[diagnostic(code(document::value))]
    Value {
        path: String,
        #[source]
        source: ValueError,
    },

    #[error("{path}: {source}")]
    #[diagnostic(code(document::content))]
    Content {
        path: String,
        #[source]
        source: ContentError,
    },

    #[error("{path}: expected {expected}, found {found}")]
    #[diagnostic(code(document::shape))]
    Shape {
        path: String,
        expected: String,
        found: &'static str,
    },

    #[error("{path}: an evaluable needs exactly one of \"effect\", \"rules\" or \"policies\"")]
    #[diagnostic(
        code(document::ambiguous_evaluable),
        help("Rules have an effect, policies have rules and policy sets have policies.")
    )]
    AmbiguousEvaluable { path: String },

    #[error("{path}: {field:?} is not allowed on a {kind}")]
    #[diagnostic(code(document::unexpected_field))]
    UnexpectedField {
        path: String,
        field: &'static str,
        kind: &'static str,
    },

    #[error("{path}: unknown content item {item:?}")]
    #[diagnostic(code(document::unknown_item))]
    UnknownItem { path: String, item: String },
}

/// Attach a document path to a lower-level error
pub(super) trait AtPath<T> {
    fn at(self, path: &str) -> DocumentResult<T>;
}

impl<T> AtPath<T> for Result<T, BuildError> {
    fn at(self, path: &str) -> DocumentResult<T> {
        self.map_err(|source| DocumentError::Build {
            path: path.to_string(),
            source,
        })
    }
}

impl<T> AtPath<T> for Result<T, ValueError> {
    fn at(self, path: &str) -> DocumentResult<T> {
        self.map_err(|source| DocumentError::Value {
            path: path.to_string(),
            source,
        })
    }
}

impl<T> AtPath<T> for Result<T, ContentError> {
    fn at(self, path: &str) -> DocumentResult<T> {
        self.map_err(|source| DocumentError::Content {
            path: path.to_string(),
            source,
        })
    }
}
