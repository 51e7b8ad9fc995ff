/*!
 * Symbols
 * Attribute and flags type declarations of a policy tree
 */

use super::errors::{ValueError, ValueResult};
use super::flags::FlagsType;
use super::kind::{Kind, ValueType};
use std::fmt;
use std::sync::Arc;

/// Declared (ID, type) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    id: String,
    ty: ValueType,
}

impl Attribute {
    pub fn new(id: impl Into<String>, ty: ValueType) -> Self {
        Self { id: id.into(), ty }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value_type(&self) -> &ValueType {
        &self.ty
    }

    pub fn kind(&self) -> Kind {
        self.ty.kind()
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.id, self.ty)
    }
}

/// Declaration table shared by a policy tree and its updates
#[derive(Debug, Clone, Default)]
pub struct Symbols {
    attributes: ahash::HashMap<String, Attribute>,
    flags: ahash::HashMap<String, Arc<FlagsType>>,
}

impl Symbols {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attribute; IDs are unique
    pub fn put_attribute(&mut self, attribute: Attribute) -> ValueResult<()> {
        if self.attributes.contains_key(attribute.id()) {
            return Err(ValueError::DuplicateAttribute(attribute.id().to_string()));
        }
        if let ValueType::Flags(ty) = attribute.value_type() {
            if !self.flags.contains_key(ty.name()) {
                return Err(ValueError::UnknownType(ty.name().to_string()));
            }
        }
        self.attributes.insert(attribute.id.clone(), attribute);
        Ok(())
    }

    /// Declare a flags type; names must not shadow built-in kinds
    pub fn put_flags_type(&mut self, ty: FlagsType) -> ValueResult<Arc<FlagsType>> {
        if Kind::from_name(ty.name()).is_some() {
            return Err(ValueError::ReservedTypeName(ty.name().to_string()));
        }
        if self.flags.contains_key(ty.name()) {
            return Err(ValueError::DuplicateFlagsType(ty.name().to_string()));
        }
        let ty = Arc::new(ty);
        self.flags.insert(ty.name().to_string(), ty.clone());
        Ok(ty)
    }

    pub fn attribute(&self, id: &str) -> Option<&Attribute> {
        self.attributes.get(id)
    }

    pub fn flags_type(&self, name: &str) -> Option<&Arc<FlagsType>> {
        self.flags.get(name)
    }

    /// Resolve a type name: built-in kind names first, then flags types
    pub fn resolve_type(&self, name: &str) -> ValueResult<ValueType> {
        if let Some(ty) = Kind::from_name(name).and_then(ValueType::builtin) {
            return Ok(ty);
        }
        self.flags
            .get(name)
            .map(|ty| ValueType::Flags(ty.clone()))
            .ok_or_else(|| ValueError::UnknownType(name.to_string()))
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> + '_ {
        self.attributes.values()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
