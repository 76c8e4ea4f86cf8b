//! Canonical validator
//!
//! Constructs the canonical record from a mapping: JSON Schema check, then
//! typed deserialization, then the model's own business rules. Each step
//! runs only when the previous one found nothing, so violations always
//! come from the most basic failing layer.
//!
//! Modality and platform accept any letter case. Their schema enumerates
//! only the dropdown spellings, so choice fields are folded to the wire
//! value before the schema check.

use serde_json::Value;
use transfer_models::{
    BasicUploadJobConfigs, CanonicalModel, Choice, FieldViolation, Modality, ModalityConfigs, Platform,
    SubmitJobRequest, ValidationErrors, ViolationKind,
};

use crate::entity::FormKind;
use crate::layout::flatten_targets;
use crate::schema::FormSchemas;

/// A validated canonical record
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalRecord {
    Modality(ModalityConfigs),
    UploadJob(BasicUploadJobConfigs),
    SubmitJob(SubmitJobRequest),
}

impl CanonicalRecord {
    #[must_use]
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Modality(_) => FormKind::Modality,
            Self::UploadJob(_) => FormKind::UploadJob,
            Self::SubmitJob(_) => FormKind::SubmitJob,
        }
    }

    /// Serialized record, computed fields included
    ///
    /// # Errors
    /// Propagates serialization failures
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Modality(record) => serde_json::to_value(record),
            Self::UploadJob(record) => serde_json::to_value(record),
            Self::SubmitJob(record) => serde_json::to_value(record),
        }
    }
}

/// Canonical record together with the payload handed downstream
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub record: CanonicalRecord,
    pub payload: Value,
}

/// Validates mappings against the canonical models
#[derive(Debug, Clone, Copy)]
pub struct CanonicalValidator<'a> {
    schemas: &'a FormSchemas,
}

impl<'a> CanonicalValidator<'a> {
    #[inline]
    #[must_use]
    pub fn new(schemas: &'a FormSchemas) -> Self {
        Self { schemas }
    }

    /// Construct the canonical record of `kind` from `value`
    ///
    /// # Errors
    /// Returns every field violation of the first layer that rejected it
    pub fn validate(&self, kind: FormKind, value: &Value) -> Result<Validated, ValidationErrors> {
        let mut value = value.clone();
        fold_choices(kind, &mut value);

        let violations = self.schemas.get(kind).canonical().check(&value);
        if !violations.is_empty() {
            return Err(violations.into());
        }

        let record = match kind {
            FormKind::Modality => CanonicalRecord::Modality(construct(value)?),
            FormKind::UploadJob => CanonicalRecord::UploadJob(construct(value)?),
            FormKind::SubmitJob => CanonicalRecord::SubmitJob(construct(value)?),
        };
        let payload = record.to_value().map_err(|err| root_violation(&err))?;

        Ok(Validated { record, payload })
    }
}

fn construct<T: CanonicalModel>(value: Value) -> Result<T, ValidationErrors> {
    let record: T = serde_json::from_value(value).map_err(|err| root_violation(&err))?;
    record.finalized()
}

type Fold = fn(&str) -> Option<&'static str>;

const MODALITY_CHOICES: &[(&str, Fold)] = &[("modality", fold::<Modality>)];
const UPLOAD_JOB_CHOICES: &[(&str, Fold)] = &[("platform", fold::<Platform>)];

fn fold<C: Choice>(raw: &str) -> Option<&'static str> {
    C::parse_choice(raw).map(C::abbreviation)
}

fn choice_fields(kind: FormKind) -> &'static [(&'static str, Fold)] {
    match kind {
        FormKind::Modality => MODALITY_CHOICES,
        FormKind::UploadJob => UPLOAD_JOB_CHOICES,
        FormKind::SubmitJob => &[],
    }
}

/// Rewrite recognized choice spellings to their wire value, recursing
/// into nested entity sequences. Unknown spellings are left for the
/// schema to report.
fn fold_choices(kind: FormKind, value: &mut Value) {
    let Some(fields) = value.as_object_mut() else {
        return;
    };
    for (key, resolve) in choice_fields(kind) {
        if let Some(Value::String(raw)) = fields.get_mut(*key) {
            if let Some(canonical) = resolve(raw.as_str()) {
                canonical.clone_into(raw);
            }
        }
    }
    for target in flatten_targets(kind) {
        if let Some(Value::Array(items)) = fields.get_mut(target.canonical_key) {
            for item in items {
                fold_choices(target.element, item);
            }
        }
    }
}

fn root_violation(err: &serde_json::Error) -> ValidationErrors {
    FieldViolation::new("", ViolationKind::InvalidValue, err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upload_job() -> Value {
        json!({
            "project_name": "Ephys Platform",
            "platform": "ECEPHYS",
            "modalities": [{"modality": "ECEPHYS", "source": "/data/x"}],
            "subject_id": "123456",
            "acq_datetime": "2024-03-01 12:30:00",
        })
    }

    #[test]
    fn validates_and_computes_fields() {
        let schemas = FormSchemas::build().unwrap();
        let validated = CanonicalValidator::new(&schemas)
            .validate(FormKind::UploadJob, &upload_job())
            .unwrap();
        assert_eq!(validated.record.kind(), FormKind::UploadJob);
        assert_eq!(validated.payload["s3_prefix"], json!("ecephys_123456_2024-03-01_12-30-00"));
        assert_eq!(validated.payload["modalities"][0]["output_folder_name"], json!("ecephys"));
        assert_eq!(validated.payload["acq_datetime"], json!("2024-03-01T12:30:00"));
    }

    #[test]
    fn schema_layer_reports_empty_sequence() {
        let schemas = FormSchemas::build().unwrap();
        let mut job = upload_job();
        job["modalities"] = json!([]);
        let errors = CanonicalValidator::new(&schemas)
            .validate(FormKind::UploadJob, &job)
            .unwrap_err();
        assert_eq!(errors.as_slice()[0].path, "/modalities");
        assert_eq!(errors.as_slice()[0].kind, ViolationKind::OutOfRange);
    }

    #[test]
    fn schema_layer_reports_bad_datetime_at_field() {
        let schemas = FormSchemas::build().unwrap();
        let mut job = upload_job();
        job["acq_datetime"] = json!("yesterday");
        let errors = CanonicalValidator::new(&schemas)
            .validate(FormKind::UploadJob, &job)
            .unwrap_err();
        assert!(errors.has_path("/acq_datetime"));
    }

    #[test]
    fn model_layer_reports_business_rules() {
        let schemas = FormSchemas::build().unwrap();
        let mut job = upload_job();
        job["subject_id"] = json!("mouse 1");
        let errors = CanonicalValidator::new(&schemas)
            .validate(FormKind::UploadJob, &job)
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.has_path("/subject_id"));
    }

    #[test]
    fn choice_spelling_ignores_letter_case() {
        let schemas = FormSchemas::build().unwrap();
        let mut job = upload_job();
        job["platform"] = json!("Smartspim");
        job["modalities"][0]["modality"] = json!("Ecephys");
        let validated = CanonicalValidator::new(&schemas)
            .validate(FormKind::UploadJob, &job)
            .unwrap();
        assert_eq!(validated.payload["platform"], json!("SmartSPIM"));
        assert_eq!(validated.payload["modalities"][0]["modality"], json!("ecephys"));
    }

    #[test]
    fn unknown_choice_keeps_submitted_spelling() {
        let schemas = FormSchemas::build().unwrap();
        let mut job = upload_job();
        job["modalities"][0]["modality"] = json!("Xray");
        let errors = CanonicalValidator::new(&schemas)
            .validate(FormKind::UploadJob, &job)
            .unwrap_err();
        assert_eq!(errors.as_slice()[0].path, "/modalities/0/modality");
        assert!(errors.as_slice()[0].message.contains("Xray"));
    }

    #[test]
    fn calendar_invalid_datetime_is_rejected_at_root() {
        let schemas = FormSchemas::build().unwrap();
        let mut job = upload_job();
        job["acq_datetime"] = json!("2024-02-31 10:00:00");
        let errors = CanonicalValidator::new(&schemas)
            .validate(FormKind::UploadJob, &job)
            .unwrap_err();
        assert_eq!(errors.as_slice()[0].path, "");
        assert_eq!(errors.as_slice()[0].kind, ViolationKind::InvalidValue);
    }
}
