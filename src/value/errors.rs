/*!
 * Value Errors
 * Typed parsing and comparison failures for the value model
 */

use super::kind::Kind;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for value operations
pub type ValueResult<T> = Result<T, ValueError>;

/// Value model errors
///
/// Parsing failures carry no position information: the caller (document
/// loader or wire decoder) knows where the text came from and wraps them.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ValueError {
    #[error("invalid boolean {0:?}")]
    #[diagnostic(code(value::invalid_boolean), help("Use \"true\" or \"false\"."))]
    InvalidBoolean(String),

    #[error("invalid integer {0:?}")]
    #[diagnostic(code(value::invalid_integer))]
    InvalidInteger(String),

    #[error("integer {0:?} overflows 64 bits")]
    #[diagnostic(code(value::integer_overflow))]
    IntegerOverflow(String),

    #[error("invalid float {0:?}")]
    #[diagnostic(code(value::invalid_float))]
    InvalidFloat(String),

    #[error("invalid address {0:?}")]
    #[diagnostic(code(value::invalid_address))]
    InvalidAddress(String),

    #[error("invalid network {0:?}")]
    #[diagnostic(code(value::invalid_network), help("Networks are written in CIDR notation, e.g. 10.0.0.0/8."))]
    InvalidNetwork(String),

    #[error("invalid escape sequence in domain {0:?}")]
    #[diagnostic(code(value::invalid_escape), help("Escapes are \\X for a literal character or \\DDD for a decimal byte value."))]
    InvalidEscape(String),

    #[error("empty label in domain {0:?}")]
    #[diagnostic(code(value::empty_label))]
    EmptyLabel(String),

    #[error("label of {length} bytes in domain {domain:?} exceeds 63 bytes")]
    #[diagnostic(code(value::label_too_long))]
    LabelTooLong { domain: String, length: usize },

    #[error("domain {domain:?} has {count} labels, more than 127")]
    #[diagnostic(code(value::too_many_labels))]
    TooManyLabels { domain: String, count: usize },

    #[error("domain {domain:?} is {length} bytes in wire format, more than 255")]
    #[diagnostic(code(value::name_too_long))]
    NameTooLong { domain: String, length: usize },

    #[error("unknown flag {flag:?} for flags type {flags_type:?}")]
    #[diagnostic(code(value::unknown_flag))]
    UnknownFlag { flags_type: String, flag: String },

    #[error("flags type {name:?} declares {count} flags, at most 64 are supported")]
    #[diagnostic(code(value::too_many_flags))]
    TooManyFlags { name: String, count: usize },

    #[error("flags type {name:?} declares no flags")]
    #[diagnostic(code(value::empty_flags_type))]
    EmptyFlagsType { name: String },

    #[error("flags type {name:?} declares flag {flag:?} twice")]
    #[diagnostic(code(value::duplicate_flag))]
    DuplicateFlag { name: String, flag: String },

    #[error("flags value {bits:#x} has bits outside of type {flags_type:?}")]
    #[diagnostic(code(value::flags_out_of_range))]
    FlagsOutOfRange { flags_type: String, bits: u64 },

    #[error("unknown type {0:?}")]
    #[diagnostic(code(value::unknown_type))]
    UnknownType(String),

    #[error("type name {0:?} is reserved for a built-in kind")]
    #[diagnostic(code(value::reserved_type_name))]
    ReservedTypeName(String),

    #[error("attribute {0:?} is already declared")]
    #[diagnostic(code(value::duplicate_attribute))]
    DuplicateAttribute(String),

    #[error("flags type {0:?} is already declared")]
    #[diagnostic(code(value::duplicate_flags_type))]
    DuplicateFlagsType(String),

    #[error("{kind} values can't be parsed from a single string")]
    #[diagnostic(code(value::not_parsable))]
    NotParsable { kind: Kind },

    #[error("operation {operation} is not defined for {left} and {right}")]
    #[diagnostic(code(value::incompatible_kinds))]
    IncompatibleKinds {
        operation: &'static str,
        left: Kind,
        right: Kind,
    },

    #[error("values {0} and {1} are not comparable")]
    #[diagnostic(code(value::not_comparable))]
    NotComparable(String, String),
}
