/*!
 * Wire Errors
 * Decoding and encoding failures of the binary request/response format
 */

use crate::value::ValueError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for wire operations
pub type WireResult<T> = Result<T, WireError>;

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum WireError {
    #[error("truncated {context}: need {needed} bytes, {remaining} left")]
    #[diagnostic(code(wire::truncated))]
    Truncated {
        context: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("{0} trailing bytes after message")]
    #[diagnostic(code(wire::trailing_bytes))]
    TrailingBytes(usize),

    #[error("unknown kind code {0}")]
    #[diagnostic(code(wire::unknown_kind), help("Kind codes range from 0 (boolean) to 14 (64-bit flags)."))]
    UnknownKind(u8),

    #[error("unknown effect code {0}")]
    #[diagnostic(code(wire::unknown_effect))]
    UnknownEffect(u8),

    #[error("invalid boolean byte {0:#04x}")]
    #[diagnostic(code(wire::invalid_boolean))]
    InvalidBoolean(u8),

    #[error("invalid address length {0}")]
    #[diagnostic(code(wire::invalid_address_length), help("Addresses are 4 (IPv4) or 16 (IPv6) octets."))]
    InvalidAddressLength(u8),

    #[error("{context} is not valid UTF-8")]
    #[diagnostic(code(wire::invalid_utf8))]
    InvalidUtf8 { context: &'static str },

    #[error("{context} of length {length} exceeds the wire limit of {limit}")]
    #[diagnostic(code(wire::too_long))]
    TooLong {
        context: &'static str,
        length: usize,
        limit: usize,
    },

    #[error("{bits}-bit flags value has no declared flags type")]
    #[diagnostic(
        code(wire::unresolved_flags),
        help("Flags attributes must be declared in the policy's attribute table.")
    )]
    UnresolvedFlags { bits: u32 },

    #[error("{actual}-bit flags value for {expected}-bit flags type {flags_type:?}")]
    #[diagnostic(code(wire::flags_width))]
    FlagsWidth {
        flags_type: String,
        expected: u32,
        actual: u32,
    },

    #[error("attribute #{index} {id:?}: {source}")]
    #[diagnostic(code(wire::attribute))]
    Attribute {
        index: usize,
        id: String,
        #[source]
        source: Box<WireError>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Value(#[from] ValueError),
}

impl WireError {
    /// Attach the position and ID of the attribute being decoded
    pub(super) fn at(self, index: usize, id: &str) -> Self {
        WireError::Attribute {
            index,
            id: id.to_string(),
            source: Box::new(self),
        }
    }
}
