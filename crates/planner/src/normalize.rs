//! Pre-validation normalizer for execution plans
//!
//! Models sometimes return a phase as a list of bullet strings or as an object
//! of sub-steps instead of one string. Those shapes are flattened in place
//! before the schema sees the payload.

use serde_json::{Map, Value};
use tracing::debug;

/// Shape of a single phase value as returned by the model
#[derive(Debug, Clone, PartialEq)]
pub enum PlanPhase {
    /// Already a single string
    Text,
    /// Array of scalars, in order
    Sequence(Vec<String>),
    /// Object of scalars, in the object's own key order
    Mapping(Vec<String>),
    /// Anything else; the schema decides
    Untouched,
}

impl PlanPhase {
    pub fn classify(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::Text,
            Value::Array(items) => items
                .iter()
                .map(render_scalar)
                .collect::<Option<Vec<_>>>()
                .map_or(Self::Untouched, Self::Sequence),
            Value::Object(map) => map
                .values()
                .map(render_scalar)
                .collect::<Option<Vec<_>>>()
                .map_or(Self::Untouched, Self::Mapping),
            Value::Null | Value::Bool(_) | Value::Number(_) => Self::Untouched,
        }
    }

    /// Replacement string, if this shape gets flattened
    pub fn flatten(self) -> Option<String> {
        match self {
            Self::Sequence(parts) | Self::Mapping(parts) => Some(parts.join(" ")),
            Self::Text | Self::Untouched => None,
        }
    }
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Flatten every list- or map-shaped phase of `plan` into a single string.
pub fn normalize_execution_plan(plan: &mut Map<String, Value>) {
    for (key, value) in plan.iter_mut() {
        if let Some(flat) = PlanPhase::classify(value).flatten() {
            debug!(phase = %key, "Flattened execution plan phase");
            *value = Value::String(flat);
        }
    }
}

/// Apply [`normalize_execution_plan`] to the `executionPlan` member of a
/// parsed response, if it is an object.
pub fn normalize_plan_payload(payload: &mut Value) {
    if let Some(plan) = payload
        .get_mut("executionPlan")
        .and_then(Value::as_object_mut)
    {
        normalize_execution_plan(plan);
    }
}
