/*!
 * Attribute Values
 * Immutable tagged union over the closed set of value kinds
 */

use super::collections::{canonical_network, DomainSet, NetworkSet, StringSet};
use super::domain::Domain;
use super::errors::{ValueError, ValueResult};
use super::flags::FlagsValue;
use super::kind::{Kind, ValueType};
use crate::core::limits::DESCRIBE_COLLECTION_LIMIT;
use ipnetwork::IpNetwork;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::net::IpAddr;
use std::num::IntErrorKind;

/// Typed attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Boolean(bool),
    String(String),
    Integer(i64),
    Float(f64),
    Address(IpAddr),
    Network(IpNetwork),
    Domain(Domain),
    SetOfStrings(StringSet),
    SetOfNetworks(NetworkSet),
    SetOfDomains(DomainSet),
    ListOfStrings(Vec<String>),
    Flags(FlagsValue),
}

impl AttributeValue {
    pub fn kind(&self) -> Kind {
        match self {
            AttributeValue::Boolean(_) => Kind::Boolean,
            AttributeValue::String(_) => Kind::String,
            AttributeValue::Integer(_) => Kind::Integer,
            AttributeValue::Float(_) => Kind::Float,
            AttributeValue::Address(_) => Kind::Address,
            AttributeValue::Network(_) => Kind::Network,
            AttributeValue::Domain(_) => Kind::Domain,
            AttributeValue::SetOfStrings(_) => Kind::SetOfStrings,
            AttributeValue::SetOfNetworks(_) => Kind::SetOfNetworks,
            AttributeValue::SetOfDomains(_) => Kind::SetOfDomains,
            AttributeValue::ListOfStrings(_) => Kind::ListOfStrings,
            AttributeValue::Flags(_) => Kind::Flags,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            AttributeValue::Flags(flags) => ValueType::Flags(flags.flags_type().clone()),
            other => match ValueType::builtin(other.kind()) {
                Some(ty) => ty,
                None => unreachable!("only flags values lack a built-in type"),
            },
        }
    }

    /// True if the value is an instance of `ty`
    pub fn is_of(&self, ty: &ValueType) -> bool {
        match (self, ty) {
            (AttributeValue::Flags(flags), ValueType::Flags(declared)) => {
                flags.flags_type() == declared
            }
            (value, ty) => value.kind() == ty.kind(),
        }
    }

    /// Parse a scalar value from its text form
    ///
    /// Collections have no single-string form and are built from their
    /// elements instead; flags accept a comma-separated list of names.
    pub fn parse(ty: &ValueType, text: &str) -> ValueResult<Self> {
        match ty {
            ValueType::Boolean => parse_boolean(text).map(AttributeValue::Boolean),
            ValueType::String => Ok(AttributeValue::String(text.to_string())),
            ValueType::Integer => parse_integer(text).map(AttributeValue::Integer),
            ValueType::Float => text
                .trim()
                .parse::<f64>()
                .map(AttributeValue::Float)
                .map_err(|_| ValueError::InvalidFloat(text.to_string())),
            ValueType::Address => parse_address(text).map(AttributeValue::Address),
            ValueType::Network => parse_network(text).map(AttributeValue::Network),
            ValueType::Domain => Domain::parse(text).map(AttributeValue::Domain),
            ValueType::Flags(flags_type) => {
                let names = text.split(',').map(str::trim).filter(|s| !s.is_empty());
                FlagsValue::from_names(flags_type.clone(), names).map(AttributeValue::Flags)
            }
            other => Err(ValueError::NotParsable { kind: other.kind() }),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value normalized to float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_domain(&self) -> Option<&Domain> {
        match self {
            AttributeValue::Domain(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<IpAddr> {
        match self {
            AttributeValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    /// Equality across compatible kinds; Integer and Float compare as Float
    pub fn equals(&self, other: &Self) -> ValueResult<bool> {
        match (self, other) {
            (AttributeValue::Integer(a), AttributeValue::Integer(b)) => Ok(a == b),
            (a, b) if a.kind().is_numeric() && b.kind().is_numeric() => {
                Ok(a.as_float() == b.as_float())
            }
            (AttributeValue::Network(a), AttributeValue::Network(b)) => {
                Ok(canonical_network(*a) == canonical_network(*b))
            }
            (a, b) if a.kind() == b.kind() => Ok(a == b),
            (a, b) => Err(ValueError::IncompatibleKinds {
                operation: "equal",
                left: a.kind(),
                right: b.kind(),
            }),
        }
    }

    /// Ordering for numeric pairs and string pairs
    pub fn compare(&self, other: &Self) -> ValueResult<Ordering> {
        match (self, other) {
            (AttributeValue::Integer(a), AttributeValue::Integer(b)) => Ok(a.cmp(b)),
            (AttributeValue::String(a), AttributeValue::String(b)) => Ok(a.cmp(b)),
            (a, b) if a.kind().is_numeric() && b.kind().is_numeric() => {
                let (x, y) = (a.as_float().unwrap_or(f64::NAN), b.as_float().unwrap_or(f64::NAN));
                x.partial_cmp(&y)
                    .ok_or_else(|| ValueError::NotComparable(a.describe(), b.describe()))
            }
            (a, b) => Err(ValueError::IncompatibleKinds {
                operation: "compare",
                left: a.kind(),
                right: b.kind(),
            }),
        }
    }

    /// Containment of `item` in `self`
    pub fn contains(&self, item: &Self) -> ValueResult<bool> {
        match (self, item) {
            (AttributeValue::String(s), AttributeValue::String(sub)) => Ok(s.contains(sub.as_str())),
            (AttributeValue::Network(n), AttributeValue::Address(a)) => Ok(n.contains(*a)),
            (AttributeValue::SetOfStrings(set), AttributeValue::String(s)) => Ok(set.contains(s)),
            (AttributeValue::SetOfNetworks(set), AttributeValue::Address(a)) => {
                Ok(set.contains_address(*a))
            }
            (AttributeValue::SetOfNetworks(set), AttributeValue::Network(n)) => {
                Ok(set.contains_network(n))
            }
            (AttributeValue::SetOfDomains(set), AttributeValue::Domain(d)) => Ok(set.contains(d)),
            (AttributeValue::ListOfStrings(list), AttributeValue::String(s)) => {
                Ok(list.iter().any(|item| item == s))
            }
            (AttributeValue::Flags(flags), AttributeValue::String(name)) => Ok(flags.is_set(name)),
            (a, b) => Err(ValueError::IncompatibleKinds {
                operation: "contains",
                left: a.kind(),
                right: b.kind(),
            }),
        }
    }

    /// Short rendering for statuses and logs
    ///
    /// Strings are quoted and collections are truncated.
    pub fn describe(&self) -> String {
        fn truncated<'a>(items: impl Iterator<Item = String> + 'a, len: usize) -> String {
            let mut shown: Vec<String> = items.take(DESCRIBE_COLLECTION_LIMIT).collect();
            if len > DESCRIBE_COLLECTION_LIMIT {
                shown.push("...".to_string());
            }
            shown.join(", ")
        }

        match self {
            AttributeValue::String(s) => format!("{s:?}"),
            AttributeValue::SetOfStrings(set) => {
                format!("set({})", truncated(set.iter().map(|s| format!("{s:?}")), set.len()))
            }
            AttributeValue::SetOfNetworks(set) => {
                format!("set({})", truncated(set.iter().map(|n| n.to_string()), set.len()))
            }
            AttributeValue::SetOfDomains(set) => {
                format!("domains({})", truncated(set.iter().map(|d| d.to_string()), set.len()))
            }
            AttributeValue::ListOfStrings(list) => {
                format!("[{}]", truncated(list.iter().map(|s| format!("{s:?}")), list.len()))
            }
            AttributeValue::Flags(flags) => format!("{}({flags})", flags.flags_type().name()),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = T>) -> fmt::Result {
            for (i, item) in items.enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            AttributeValue::Boolean(b) => write!(f, "{b}"),
            AttributeValue::String(s) => f.write_str(s),
            AttributeValue::Integer(i) => write!(f, "{i}"),
            AttributeValue::Float(x) => write!(f, "{x}"),
            AttributeValue::Address(a) => write!(f, "{a}"),
            AttributeValue::Network(n) => write!(f, "{n}"),
            AttributeValue::Domain(d) => write!(f, "{d}"),
            AttributeValue::SetOfStrings(set) => join(f, set.iter()),
            AttributeValue::SetOfNetworks(set) => join(f, set.iter()),
            AttributeValue::SetOfDomains(set) => join(f, set.iter()),
            AttributeValue::ListOfStrings(list) => join(f, list.iter()),
            AttributeValue::Flags(flags) => write!(f, "{flags}"),
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        fn seq<S: Serializer, T: Serialize>(
            serializer: S,
            len: usize,
            items: impl Iterator<Item = T>,
        ) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(len))?;
            for item in items {
                seq.serialize_element(&item)?;
            }
            seq.end()
        }

        match self {
            AttributeValue::Boolean(b) => serializer.serialize_bool(*b),
            AttributeValue::String(s) => serializer.serialize_str(s),
            AttributeValue::Integer(i) => serializer.serialize_i64(*i),
            AttributeValue::Float(x) => serializer.serialize_f64(*x),
            AttributeValue::Address(_)
            | AttributeValue::Network(_)
            | AttributeValue::Domain(_) => serializer.collect_str(self),
            AttributeValue::SetOfStrings(set) => seq(serializer, set.len(), set.iter()),
            AttributeValue::SetOfNetworks(set) => {
                seq(serializer, set.len(), set.iter().map(|n| n.to_string()))
            }
            AttributeValue::SetOfDomains(set) => {
                seq(serializer, set.len(), set.iter().map(|d| d.to_string()))
            }
            AttributeValue::ListOfStrings(list) => seq(serializer, list.len(), list.iter()),
            AttributeValue::Flags(flags) => {
                let names: Vec<&str> = flags.names().collect();
                seq(serializer, names.len(), names.into_iter())
            }
        }
    }
}

fn parse_boolean(text: &str) -> ValueResult<bool> {
    match text.trim() {
        t if t.eq_ignore_ascii_case("true") => Ok(true),
        t if t.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(ValueError::InvalidBoolean(text.to_string())),
    }
}

fn parse_integer(text: &str) -> ValueResult<i64> {
    text.trim().parse::<i64>().map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ValueError::IntegerOverflow(text.to_string())
        }
        _ => ValueError::InvalidInteger(text.to_string()),
    })
}

fn parse_address(text: &str) -> ValueResult<IpAddr> {
    text.trim()
        .parse::<IpAddr>()
        .map_err(|_| ValueError::InvalidAddress(text.to_string()))
}

/// Parse CIDR notation; the prefix length is required
pub fn parse_network(text: &str) -> ValueResult<IpNetwork> {
    let trimmed = text.trim();
    if !trimmed.contains('/') {
        return Err(ValueError::InvalidNetwork(text.to_string()));
    }
    trimmed
        .parse::<IpNetwork>()
        .map(canonical_network)
        .map_err(|_| ValueError::InvalidNetwork(text.to_string()))
}
