/*!
 * Flags Types
 * User-declared enumerations stored as bit masks
 */

use super::errors::{ValueError, ValueResult};
use crate::core::limits::MAX_FLAGS;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Storage width of a flags type, the narrowest that holds every flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagsWidth {
    W8,
    W16,
    W32,
    W64,
}

impl FlagsWidth {
    /// Narrowest width holding `count` flags
    pub fn for_count(count: usize) -> Option<Self> {
        match count {
            0..=8 => Some(FlagsWidth::W8),
            9..=16 => Some(FlagsWidth::W16),
            17..=32 => Some(FlagsWidth::W32),
            33..=64 => Some(FlagsWidth::W64),
            _ => None,
        }
    }

    pub const fn bits(self) -> u32 {
        match self {
            FlagsWidth::W8 => 8,
            FlagsWidth::W16 => 16,
            FlagsWidth::W32 => 32,
            FlagsWidth::W64 => 64,
        }
    }

    pub const fn bytes(self) -> usize {
        self.bits() as usize / 8
    }
}

/// Named enumeration with a fixed bit-to-name mapping
///
/// Bit `i` stands for the `i`-th declared flag.
#[derive(Debug, Clone)]
pub struct FlagsType {
    name: String,
    flags: Vec<String>,
    index: ahash::HashMap<String, u8>,
    width: FlagsWidth,
}

impl FlagsType {
    pub fn new<I, S>(name: impl Into<String>, flags: I) -> ValueResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let flags: Vec<String> = flags.into_iter().map(Into::into).collect();

        if flags.is_empty() {
            return Err(ValueError::EmptyFlagsType { name });
        }
        if flags.len() > MAX_FLAGS {
            return Err(ValueError::TooManyFlags {
                name,
                count: flags.len(),
            });
        }

        let mut index = ahash::HashMap::default();
        for (bit, flag) in flags.iter().enumerate() {
            if index.insert(flag.clone(), bit as u8).is_some() {
                return Err(ValueError::DuplicateFlag {
                    name,
                    flag: flag.clone(),
                });
            }
        }

        // Non-empty and at most MAX_FLAGS, so a width always exists
        let width = FlagsWidth::for_count(flags.len()).unwrap_or(FlagsWidth::W64);

        Ok(Self {
            name,
            flags,
            index,
            width,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> FlagsWidth {
        self.width
    }

    /// Declared flag names in bit order
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Bit position of a flag name
    pub fn bit(&self, flag: &str) -> Option<u8> {
        self.index.get(flag).copied()
    }

    /// Mask with every declared flag set
    pub fn mask(&self) -> u64 {
        if self.flags.len() == 64 {
            u64::MAX
        } else {
            (1u64 << self.flags.len()) - 1
        }
    }

    /// Assemble a bit mask from flag names
    pub fn bits_from_names<I, S>(&self, names: I) -> ValueResult<u64>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().try_fold(0u64, |bits, name| {
            let name = name.as_ref();
            self.bit(name)
                .map(|bit| bits | (1u64 << bit))
                .ok_or_else(|| ValueError::UnknownFlag {
                    flags_type: self.name.clone(),
                    flag: name.to_string(),
                })
        })
    }
}

impl PartialEq for FlagsType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.flags == other.flags
    }
}

impl Eq for FlagsType {}

impl Hash for FlagsType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.flags.hash(state);
    }
}

/// Value of a flags type
#[derive(Debug, Clone)]
pub struct FlagsValue {
    ty: Arc<FlagsType>,
    bits: u64,
}

impl FlagsValue {
    /// Wrap raw bits, rejecting bits beyond the declared flags
    pub fn new(ty: Arc<FlagsType>, bits: u64) -> ValueResult<Self> {
        if bits & !ty.mask() != 0 {
            return Err(ValueError::FlagsOutOfRange {
                flags_type: ty.name().to_string(),
                bits,
            });
        }
        Ok(Self { ty, bits })
    }

    pub fn from_names<I, S>(ty: Arc<FlagsType>, names: I) -> ValueResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bits = ty.bits_from_names(names)?;
        Ok(Self { ty, bits })
    }

    pub fn flags_type(&self) -> &Arc<FlagsType> {
        &self.ty
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn is_set(&self, flag: &str) -> bool {
        self.ty
            .bit(flag)
            .map(|bit| self.bits & (1u64 << bit) != 0)
            .unwrap_or(false)
    }

    /// Names of the set flags, in bit order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.ty
            .flags
            .iter()
            .enumerate()
            .filter(move |(bit, _)| self.bits & (1u64 << bit) != 0)
            .map(|(_, name)| name.as_str())
    }
}

impl PartialEq for FlagsValue {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits && (Arc::ptr_eq(&self.ty, &other.ty) || self.ty == other.ty)
    }
}

impl fmt::Display for FlagsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names().collect();
        write!(f, "{}", names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("f{i}")).collect()
    }

    #[test]
    fn test_width_selection() {
        assert_eq!(FlagsType::new("a", numbered(1)).unwrap().width(), FlagsWidth::W8);
        assert_eq!(FlagsType::new("a", numbered(8)).unwrap().width(), FlagsWidth::W8);
        assert_eq!(FlagsType::new("a", numbered(9)).unwrap().width(), FlagsWidth::W16);
        assert_eq!(FlagsType::new("a", numbered(32)).unwrap().width(), FlagsWidth::W32);
        assert_eq!(FlagsType::new("a", numbered(33)).unwrap().width(), FlagsWidth::W64);
        assert_eq!(FlagsType::new("a", numbered(64)).unwrap().mask(), u64::MAX);
    }

    #[test]
    fn test_declaration_errors() {
        assert!(matches!(
            FlagsType::new("a", numbered(65)),
            Err(ValueError::TooManyFlags { count: 65, .. })
        ));
        assert!(matches!(
            FlagsType::new("a", Vec::<String>::new()),
            Err(ValueError::EmptyFlagsType { .. })
        ));
        assert!(matches!(
            FlagsType::new("a", ["x", "y", "x"]),
            Err(ValueError::DuplicateFlag { .. })
        ));
    }

    #[test]
    fn test_bits_from_names() {
        let ty = Arc::new(FlagsType::new("colors", ["red", "green", "blue"]).unwrap());
        let value = FlagsValue::from_names(ty.clone(), ["blue", "red"]).unwrap();
        assert_eq!(value.bits(), 0b101);
        assert_eq!(value.names().collect::<Vec<_>>(), vec!["red", "blue"]);
        assert!(value.is_set("blue"));
        assert!(!value.is_set("green"));

        let err = FlagsValue::from_names(ty.clone(), ["purple"]).unwrap_err();
        assert!(matches!(err, ValueError::UnknownFlag { .. }));

        assert!(FlagsValue::new(ty, 0b1000).is_err());
    }
}
