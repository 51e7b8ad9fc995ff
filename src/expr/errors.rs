/*!
 * Expression Errors
 * Build-time rejections and evaluation-time failures
 */

use crate::content::ContentError;
use crate::value::{Kind, ValueError};
use miette::Diagnostic;
use thiserror::Error;

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Result type for tree construction
pub type BuildResult<T> = Result<T, BuildError>;

/// Failure while evaluating against a request
///
/// Contained by the tree as an indeterminate effect; never escapes a decision.
#[derive(Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum EvalError {
    #[error("missing value for attribute {0:?}")]
    #[diagnostic(code(eval::missing_value))]
    MissingValue(String),

    #[error("attribute {id:?} is {actual} but {expected} is expected")]
    #[diagnostic(code(eval::type_mismatch))]
    TypeMismatch {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("expected {expected} for {context}, got {actual}")]
    #[diagnostic(code(eval::unexpected_kind))]
    UnexpectedKind {
        context: &'static str,
        expected: Kind,
        actual: Kind,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Value(#[from] ValueError),

    #[error("division by zero")]
    #[diagnostic(code(eval::division_by_zero))]
    DivisionByZero,

    #[error("integer overflow in {0}")]
    #[diagnostic(code(eval::integer_overflow))]
    IntegerOverflow(&'static str),

    #[error("no child selected by {0}")]
    #[diagnostic(code(eval::no_child_selected))]
    NoChildSelected(String),

    #[error("{node}: {source}")]
    #[diagnostic(code(eval::bound))]
    Bound {
        node: String,
        #[source]
        source: Box<EvalError>,
    },

    #[error("{}", join(.0))]
    #[diagnostic(code(eval::multiple))]
    Multiple(Vec<EvalError>),
}

fn join(errors: &[EvalError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl EvalError {
    /// Attach the description of the node the error surfaced in
    pub fn bind(self, node: impl Into<String>) -> Self {
        EvalError::Bound {
            node: node.into(),
            source: Box::new(self),
        }
    }

    /// Combine two errors, flattening nested lists
    pub fn merge(self, other: EvalError) -> Self {
        let mut errors = match self {
            EvalError::Multiple(errors) => errors,
            single => vec![single],
        };
        match other {
            EvalError::Multiple(more) => errors.extend(more),
            single => errors.push(single),
        }
        EvalError::Multiple(errors)
    }

    /// Innermost error, skipping node bindings
    pub fn root_cause(&self) -> &EvalError {
        match self {
            EvalError::Bound { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True when a lookup found no value, as opposed to failing
    pub fn is_missing(&self) -> bool {
        matches!(
            self.root_cause(),
            EvalError::MissingValue(_) | EvalError::Content(ContentError::KeyNotFound(_))
        )
    }
}

/// Rejection of an ill-formed tree or expression
#[derive(Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum BuildError {
    #[error("unknown function {name:?} for arguments ({args})")]
    #[diagnostic(
        code(build::unknown_function),
        help("Functions are resolved by name and argument types. Check the argument types.")
    )]
    UnknownFunction { name: String, args: String },

    #[error("function {name:?} takes {expected} arguments, got {actual}")]
    #[diagnostic(code(build::argument_count))]
    ArgumentCount {
        name: String,
        expected: &'static str,
        actual: usize,
    },

    #[error("unknown attribute {0:?}")]
    #[diagnostic(
        code(build::unknown_attribute),
        help("Declare the attribute before using it.")
    )]
    UnknownAttribute(String),

    #[error("invalid match: {0}")]
    #[diagnostic(
        code(build::invalid_match),
        help("A match compares exactly one attribute or selector with one literal value using equal, contains, greater or less.")
    )]
    InvalidMatch(String),

    #[error("condition must be boolean, got {0}")]
    #[diagnostic(code(build::condition_not_boolean))]
    ConditionNotBoolean(String),

    #[error("obligation {id:?} is {expected} but its expression gives {actual}")]
    #[diagnostic(code(build::obligation_type))]
    ObligationType {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("invalid selector: {0}")]
    #[diagnostic(
        code(build::invalid_selector),
        help("Selector URIs look like \"local:content/item\" and path elements must be string, address, network or domain.")
    )]
    InvalidSelector(String),

    #[error("unknown combining algorithm {0:?}")]
    #[diagnostic(
        code(build::unknown_algorithm),
        help("Use firstApplicableEffect, denyOverrides, permitOverrides, denyUnlessPermit, permitUnlessDeny or mapper.")
    )]
    UnknownAlgorithm(String),

    #[error("unknown mapper order {0:?}")]
    #[diagnostic(code(build::unknown_order), help("Use internal, external or fast."))]
    UnknownOrder(String),

    #[error("mapper argument must be string, set of strings, list of strings or flags, got {0}")]
    #[diagnostic(code(build::mapper_argument))]
    MapperArgument(String),

    #[error("mapper over {0} needs a sub-algorithm to combine several children")]
    #[diagnostic(code(build::missing_sub_algorithm))]
    MissingSubAlgorithm(String),

    #[error("mapper can't use another mapper as its sub-algorithm")]
    #[diagnostic(code(build::nested_mapper))]
    NestedMapper,

    #[error("mapper {role} child {id:?} doesn't exist")]
    #[diagnostic(
        code(build::dangling_reference),
        help("Default and error children must be named children of the same node.")
    )]
    DanglingReference { role: &'static str, id: String },

    #[error("duplicate child id {0:?}")]
    #[diagnostic(code(build::duplicate_child))]
    DuplicateChild(String),

    #[error("rule effect must be permit or deny, got {0:?}")]
    #[diagnostic(code(build::invalid_effect))]
    InvalidEffect(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Value(#[from] ValueError),
}
