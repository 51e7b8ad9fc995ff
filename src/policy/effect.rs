/*!
 * Effects
 * Decision outcomes including the extended indeterminate variants
 */

use crate::expr::BuildError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Outcome of a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Effect {
    Deny = 0,
    Permit = 1,
    NotApplicable = 2,
    Indeterminate = 3,
    IndeterminateD = 4,
    IndeterminateP = 5,
    IndeterminateDP = 6,
}

impl Effect {
    pub const ALL: [Effect; 7] = [
        Effect::Deny,
        Effect::Permit,
        Effect::NotApplicable,
        Effect::Indeterminate,
        Effect::IndeterminateD,
        Effect::IndeterminateP,
        Effect::IndeterminateDP,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Effect::Deny => "Deny",
            Effect::Permit => "Permit",
            Effect::NotApplicable => "NotApplicable",
            Effect::Indeterminate => "Indeterminate",
            Effect::IndeterminateD => "Indeterminate{D}",
            Effect::IndeterminateP => "Indeterminate{P}",
            Effect::IndeterminateDP => "Indeterminate{DP}",
        }
    }

    /// Wire code
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Effect> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Permit or Deny
    pub const fn is_decisive(self) -> bool {
        matches!(self, Effect::Permit | Effect::Deny)
    }

    pub const fn is_indeterminate(self) -> bool {
        matches!(
            self,
            Effect::Indeterminate | Effect::IndeterminateD | Effect::IndeterminateP | Effect::IndeterminateDP
        )
    }

    /// Indeterminate variant for a failure on the way to `self`
    ///
    /// Decisive effects map to their D/P variants, indeterminate effects are
    /// kept and NotApplicable stays NotApplicable.
    pub const fn as_indeterminate(self) -> Effect {
        match self {
            Effect::Deny => Effect::IndeterminateD,
            Effect::Permit => Effect::IndeterminateP,
            other => other,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Effect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Effect a rule declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleEffect {
    Permit,
    Deny,
}

impl RuleEffect {
    pub const fn effect(self) -> Effect {
        match self {
            RuleEffect::Permit => Effect::Permit,
            RuleEffect::Deny => Effect::Deny,
        }
    }

    /// Effect when the rule fails to evaluate
    pub const fn indeterminate(self) -> Effect {
        self.effect().as_indeterminate()
    }
}

impl From<RuleEffect> for Effect {
    fn from(effect: RuleEffect) -> Self {
        effect.effect()
    }
}

impl FromStr for RuleEffect {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("permit") {
            Ok(RuleEffect::Permit)
        } else if s.eq_ignore_ascii_case("deny") {
            Ok(RuleEffect::Deny)
        } else {
            Err(BuildError::InvalidEffect(s.to_string()))
        }
    }
}
