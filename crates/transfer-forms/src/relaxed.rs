//! Relaxed form parsing
//!
//! raw JSON → object check → multiplicity normalization → relaxed schema
//! check → unknown keys dropped. A [`RelaxedForm`] only exists once all of
//! these succeeded, which is what the lifter relies on.

use serde_json::{Map, Value};
use tracing::debug;
use transfer_models::FieldViolation;

use crate::entity::FormKind;
use crate::error::{json_type_name, ShapeError};
use crate::layout::flatten_targets;
use crate::normalize::normalize_multiplicity;
use crate::schema::FormSchemas;

/// A parsed, normalized form submission
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxedForm {
    kind: FormKind,
    fields: Map<String, Value>,
}

impl RelaxedForm {
    /// Parse raw submitted data
    ///
    /// # Errors
    /// Returns [`ShapeError`] if the input is not an object or the relaxed
    /// schema rejects it after normalization
    pub fn parse(schemas: &FormSchemas, kind: FormKind, mut raw: Value) -> Result<Self, ShapeError> {
        match raw.as_object_mut() {
            Some(fields) => normalize_multiplicity(kind, fields),
            None => return Err(not_an_object(kind, &raw)),
        }

        let violations: Vec<FieldViolation> = schemas.get(kind).relaxed().check(&raw);
        if !violations.is_empty() {
            return Err(ShapeError::rejected(kind, violations));
        }

        match raw {
            Value::Object(mut fields) => {
                strip_unknown(schemas, kind, &mut fields, "");
                Ok(Self { kind, fields })
            }
            other => Err(not_an_object(kind, &other)),
        }
    }

    /// Parse a JSON document
    ///
    /// # Errors
    /// Returns [`ShapeError::Syntax`] for malformed JSON, otherwise as [`RelaxedForm::parse`]
    pub fn parse_str(schemas: &FormSchemas, kind: FormKind, text: &str) -> Result<Self, ShapeError> {
        let raw: Value = serde_json::from_str(text).map_err(|err| ShapeError::Syntax {
            form: kind,
            message: err.to_string(),
        })?;
        Self::parse(schemas, kind, raw)
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> FormKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    #[inline]
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Record as a JSON object
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

fn not_an_object(form: FormKind, value: &Value) -> ShapeError {
    ShapeError::NotAnObject {
        form,
        found: json_type_name(value),
    }
}

/// Drop keys the form does not declare, recursing into nested forms
fn strip_unknown(schemas: &FormSchemas, kind: FormKind, fields: &mut Map<String, Value>, path: &str) {
    let known = schemas.get(kind).fields();
    fields.retain(|key, _| {
        let keep = known.contains(key);
        if !keep {
            debug!(form = %kind, path, key = %key, "dropping undeclared form field");
        }
        keep
    });

    for target in flatten_targets(kind) {
        if let Some(Value::Object(nested)) = fields.get_mut(target.relaxed_key) {
            let nested_path = format!("{path}/{}", target.relaxed_key);
            strip_unknown(schemas, target.element, nested, &nested_path);
        }
    }
}
