/*!
 * Value Model
 * Typed, immutable attribute values and the declaration table
 *
 * ## Features
 * - Closed set of kinds with exhaustive matching
 * - Kind-specific parsing with typed errors (no panics on bad input)
 * - Integer/Float comparisons normalize to Float
 * - Flags stored in the narrowest width holding the declared names
 */

mod attribute_value;
mod collections;
mod domain;
mod errors;
mod flags;
mod kind;
mod symbols;

pub use attribute_value::{parse_network, AttributeValue};
pub use collections::{canonical_network, DomainSet, NetworkSet, StringSet};
pub use domain::Domain;
pub use errors::{ValueError, ValueResult};
pub use flags::{FlagsType, FlagsValue, FlagsWidth};
pub use kind::{Kind, ValueType};
pub use symbols::{Attribute, Symbols};
