//! Relaxed-to-canonical lifter
//!
//! Every flatten target's singular value is lifted first and then wrapped
//! in a one-element sequence under the canonical key, so nested collapses
//! resolve innermost first.

use serde_json::{Map, Value};

use crate::entity::FormKind;
use crate::error::{json_type_name, LiftError};
use crate::layout::flatten_targets;
use crate::relaxed::RelaxedForm;

/// Canonical-shaped mapping, ready for validation
#[derive(Debug, Clone, PartialEq)]
pub struct LiftedForm {
    kind: FormKind,
    fields: Map<String, Value>,
}

impl LiftedForm {
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

    /// Mapping as a JSON object
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Lift a parsed relaxed form
///
/// # Errors
/// Returns [`LiftError`] only if the form's nested values are not objects,
/// which relaxed parsing rules out
pub fn lift(form: &RelaxedForm) -> Result<LiftedForm, LiftError> {
    let kind = form.kind();
    let fields = lift_fields(kind, form.fields().clone(), "")?;
    Ok(LiftedForm { kind, fields })
}

/// Lift a relaxed mapping of `kind` found at `path`
///
/// An absent or `null` singular key is left as submitted; canonical
/// validation reports the missing sequence.
///
/// # Errors
/// - [`LiftError::Collision`] if the canonical key is already present
/// - [`LiftError::NotAnObject`] if the singular value is not an object
pub fn lift_fields(
    kind: FormKind,
    mut fields: Map<String, Value>,
    path: &str,
) -> Result<Map<String, Value>, LiftError> {
    for target in flatten_targets(kind) {
        if fields.contains_key(target.canonical_key) {
            return Err(LiftError::Collision {
                path: path.to_owned(),
                relaxed_key: target.relaxed_key,
                canonical_key: target.canonical_key,
            });
        }

        let nested_path = format!("{path}/{}", target.relaxed_key);
        match fields.remove(target.relaxed_key) {
            None => {}
            Some(Value::Null) => {
                fields.insert(target.relaxed_key.to_owned(), Value::Null);
            }
            Some(Value::Object(nested)) => {
                let lifted = lift_fields(target.element, nested, &nested_path)?;
                fields.insert(
                    target.canonical_key.to_owned(),
                    Value::Array(vec![Value::Object(lifted)]),
                );
            }
            Some(other) => {
                return Err(LiftError::NotAnObject {
                    path: nested_path,
                    canonical_key: target.canonical_key,
                    found: json_type_name(&other),
                })
            }
        }
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn wraps_singular_modality() {
        let lifted = lift_fields(
            FormKind::UploadJob,
            object(json!({"modality": {"modality": "ECEPHYS", "source": "/data/x"}})),
            "",
        )
        .unwrap();
        assert_eq!(
            Value::Object(lifted),
            json!({"modalities": [{"modality": "ECEPHYS", "source": "/data/x"}]})
        );
    }

    #[test]
    fn lifts_innermost_first() {
        let lifted = lift_fields(
            FormKind::SubmitJob,
            object(json!({
                "upload_job": {"project_name": "p", "modality": {"modality": "SPIM", "source": "/s"}},
            })),
            "",
        )
        .unwrap();
        assert_eq!(
            Value::Object(lifted),
            json!({"upload_jobs": [{"project_name": "p", "modalities": [{"modality": "SPIM", "source": "/s"}]}]})
        );
    }

    #[test]
    fn modality_form_is_unchanged() {
        let fields = object(json!({"modality": "ECEPHYS", "source": "/data/x"}));
        assert_eq!(lift_fields(FormKind::Modality, fields.clone(), "").unwrap(), fields);
    }

    #[test]
    fn absent_and_null_are_left_alone() {
        let absent = object(json!({"project_name": "p"}));
        assert_eq!(lift_fields(FormKind::UploadJob, absent.clone(), "").unwrap(), absent);

        let null = object(json!({"project_name": "p", "modality": null}));
        assert_eq!(lift_fields(FormKind::UploadJob, null.clone(), "").unwrap(), null);
    }

    #[test]
    fn scalar_singular_value_is_a_contract_violation() {
        let err = lift_fields(
            FormKind::SubmitJob,
            object(json!({"upload_job": {"modality": "ECEPHYS"}})),
            "",
        )
        .unwrap_err();
        assert_eq!(
            err,
            LiftError::NotAnObject {
                path: "/upload_job/modality".to_owned(),
                canonical_key: "modalities",
                found: "string",
            }
        );
    }

    #[test]
    fn collision_is_a_contract_violation() {
        let err = lift_fields(
            FormKind::UploadJob,
            object(json!({"modality": {}, "modalities": []})),
            "",
        )
        .unwrap_err();
        assert!(matches!(err, LiftError::Collision { .. }));
    }
}
