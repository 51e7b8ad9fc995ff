/*!
 * Value Kinds
 * Closed set of attribute value kinds and full value types
 */

use super::flags::FlagsType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Tag of an attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Boolean,
    String,
    Integer,
    Float,
    Address,
    Network,
    Domain,
    SetOfStrings,
    SetOfNetworks,
    SetOfDomains,
    ListOfStrings,
    Flags,
}

impl Kind {
    /// Every built-in kind except flags, which are user-declared
    pub const BUILTIN: [Kind; 11] = [
        Kind::Boolean,
        Kind::String,
        Kind::Integer,
        Kind::Float,
        Kind::Address,
        Kind::Network,
        Kind::Domain,
        Kind::SetOfStrings,
        Kind::SetOfNetworks,
        Kind::SetOfDomains,
        Kind::ListOfStrings,
    ];

    /// Human-readable name used by documents and error messages
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Boolean => "boolean",
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Float => "float",
            Kind::Address => "address",
            Kind::Network => "network",
            Kind::Domain => "domain",
            Kind::SetOfStrings => "set of strings",
            Kind::SetOfNetworks => "set of networks",
            Kind::SetOfDomains => "set of domains",
            Kind::ListOfStrings => "list of strings",
            Kind::Flags => "flags",
        }
    }

    /// Look up a built-in kind by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Kind> {
        Self::BUILTIN
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Numeric kinds compare with each other
    pub const fn is_numeric(self) -> bool {
        matches!(self, Kind::Integer | Kind::Float)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Full type of a value: a kind plus, for flags, the declared flags type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Boolean,
    String,
    Integer,
    Float,
    Address,
    Network,
    Domain,
    SetOfStrings,
    SetOfNetworks,
    SetOfDomains,
    ListOfStrings,
    Flags(Arc<FlagsType>),
}

impl ValueType {
    /// Type of a built-in kind; `None` for flags, which need a declaration
    pub fn builtin(kind: Kind) -> Option<ValueType> {
        Some(match kind {
            Kind::Boolean => ValueType::Boolean,
            Kind::String => ValueType::String,
            Kind::Integer => ValueType::Integer,
            Kind::Float => ValueType::Float,
            Kind::Address => ValueType::Address,
            Kind::Network => ValueType::Network,
            Kind::Domain => ValueType::Domain,
            Kind::SetOfStrings => ValueType::SetOfStrings,
            Kind::SetOfNetworks => ValueType::SetOfNetworks,
            Kind::SetOfDomains => ValueType::SetOfDomains,
            Kind::ListOfStrings => ValueType::ListOfStrings,
            Kind::Flags => return None,
        })
    }

    pub fn kind(&self) -> Kind {
        match self {
            ValueType::Boolean => Kind::Boolean,
            ValueType::String => Kind::String,
            ValueType::Integer => Kind::Integer,
            ValueType::Float => Kind::Float,
            ValueType::Address => Kind::Address,
            ValueType::Network => Kind::Network,
            ValueType::Domain => Kind::Domain,
            ValueType::SetOfStrings => Kind::SetOfStrings,
            ValueType::SetOfNetworks => Kind::SetOfNetworks,
            ValueType::SetOfDomains => Kind::SetOfDomains,
            ValueType::ListOfStrings => Kind::ListOfStrings,
            ValueType::Flags(_) => Kind::Flags,
        }
    }

    /// Declared flags type, if this is a flags type
    pub fn flags(&self) -> Option<&Arc<FlagsType>> {
        match self {
            ValueType::Flags(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ValueType::Flags(ty) => ty.name(),
            other => other.kind().name(),
        }
    }
}

impl From<Arc<FlagsType>> for ValueType {
    fn from(ty: Arc<FlagsType>) -> Self {
        ValueType::Flags(ty)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
