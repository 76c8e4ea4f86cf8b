//! Field multiplicity normalizer
//!
//! Multi-select widgets submit a bare value when one option is picked and a
//! list when several are. Every multi-select field is coerced to a list
//! before the relaxed schema sees the record.

use serde_json::{Map, Value};

use crate::entity::FormKind;
use crate::layout::{flatten_targets, multi_select_fields};

/// Wrap a scalar (including `null`) in a one-element list
///
/// Lists pass through unchanged, order preserved.
#[must_use]
pub fn coerce_to_sequence(value: Value) -> Value {
    match value {
        Value::Array(_) => value,
        scalar => Value::Array(vec![scalar]),
    }
}

/// Normalize every multi-select field of a form, including nested forms
///
/// Absent fields stay absent. Nested forms are only visited when the
/// singular value is an object; anything else is left for the relaxed
/// schema to reject.
pub fn normalize_multiplicity(kind: FormKind, fields: &mut Map<String, Value>) {
    for key in multi_select_fields(kind) {
        if let Some(value) = fields.get_mut(key) {
            *value = coerce_to_sequence(value.take());
        }
    }

    for target in flatten_targets(kind) {
        if let Some(Value::Object(nested)) = fields.get_mut(target.relaxed_key) {
            normalize_multiplicity(target.element, nested);
        }
    }
}
