/*!
 * Responses
 * Effect, resolved obligations and status of a decision
 */

use super::effect::Effect;
use crate::expr::{AttributeAssignment, EvalError};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

/// Result of evaluating a node
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub effect: Effect,
    pub obligations: Vec<AttributeAssignment>,
    pub status: Option<EvalError>,
}

impl Response {
    pub fn new(effect: Effect) -> Self {
        Self {
            effect,
            obligations: Vec::new(),
            status: None,
        }
    }

    pub fn not_applicable() -> Self {
        Self::new(Effect::NotApplicable)
    }

    pub fn indeterminate(effect: Effect, error: EvalError) -> Self {
        debug_assert!(effect.is_indeterminate());
        Self {
            effect,
            obligations: Vec::new(),
            status: Some(error),
        }
    }

    pub fn with_obligations(mut self, obligations: Vec<AttributeAssignment>) -> Self {
        self.obligations = obligations;
        self
    }

    /// Record an error without touching the effect
    pub fn add_status(&mut self, error: EvalError) {
        self.status = Some(match self.status.take() {
            Some(existing) => existing.merge(error),
            None => error,
        });
    }

    pub fn is_decisive(&self) -> bool {
        self.effect.is_decisive()
    }

    /// Status text, empty when the response carries no error
    pub fn status_message(&self) -> String {
        self.status.as_ref().map(ToString::to_string).unwrap_or_default()
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Response", 3)?;
        state.serialize_field("effect", &self.effect)?;
        state.serialize_field("obligations", &self.obligations)?;
        state.serialize_field("status", &self.status.as_ref().map(ToString::to_string))?;
        state.end()
    }
}
