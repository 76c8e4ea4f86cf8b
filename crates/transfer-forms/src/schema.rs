//! Schema tiers
//!
//! The canonical JSON Schema of each entity is generated from its model
//! type. The relaxed (form) schema is derived from it by applying the form
//! layout, so the two tiers share every field definition and enumeration.
//! Both tiers are compiled once and reused for every submission.

use std::collections::BTreeSet;
use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema, ValidationError};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use transfer_models::{
    join_path, BasicUploadJobConfigs, FieldViolation, ModalityConfigs, SubmitJobRequest, ViolationKind,
};

use crate::entity::FormKind;
use crate::error::SchemaError;
use crate::layout::{flatten_targets, hidden_fields, multi_select_fields};

/// Which tier a schema describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaTier {
    /// UI-facing form
    Relaxed,
    /// Authoritative entity
    Canonical,
}

impl fmt::Display for SchemaTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relaxed => f.write_str("relaxed"),
            Self::Canonical => f.write_str("canonical"),
        }
    }
}

fn render<T: JsonSchema>(form: FormKind) -> Result<Map<String, Value>, SchemaError> {
    let root = schema_for!(T);
    serde_json::to_value(&root)
        .and_then(serde_json::from_value)
        .map_err(|source| SchemaError::Render { form, source })
}

fn canonical_map(form: FormKind) -> Result<Map<String, Value>, SchemaError> {
    let mut root = match form {
        FormKind::Modality => render::<ModalityConfigs>(form),
        FormKind::UploadJob => render::<BasicUploadJobConfigs>(form),
        FormKind::SubmitJob => render::<SubmitJobRequest>(form),
    }?;
    for_each_entity(form, &mut root, |kind, schema| {
        allow_repeated_selections(kind, schema);
        Ok(())
    })?;
    Ok(root)
}

/// Apply `edit` to the root schema and to every nested entity definition
fn for_each_entity<F>(form: FormKind, root: &mut Map<String, Value>, mut edit: F) -> Result<(), SchemaError>
where
    F: FnMut(FormKind, &mut Map<String, Value>) -> Result<(), SchemaError>,
{
    edit(form, root)?;
    if let Some(Value::Object(definitions)) = root.get_mut("definitions") {
        for nested in FormKind::ALL {
            if let Some(Value::Object(definition)) = definitions.get_mut(nested.schema_name()) {
                edit(nested, definition)?;
            }
        }
    }
    Ok(())
}

/// Multi-select sets collapse repeated values on construction
fn allow_repeated_selections(form: FormKind, schema: &mut Map<String, Value>) {
    let Some(Value::Object(properties)) = schema.get_mut("properties") else {
        return;
    };
    for key in multi_select_fields(form) {
        if let Some(Value::Object(property)) = properties.get_mut(key) {
            property.remove("uniqueItems");
        }
    }
}

/// Canonical JSON Schema of an entity
///
/// # Errors
/// Returns [`SchemaError::Render`] if the generated schema is not an object
pub fn canonical_schema(form: FormKind) -> Result<Value, SchemaError> {
    canonical_map(form).map(Value::Object)
}

/// Relaxed JSON Schema of a form
///
/// Flatten targets become singular properties holding the element schema,
/// hidden fields disappear. Nested entity definitions get their own
/// form's layout, so a submit-job form nests relaxed upload jobs.
///
/// # Errors
/// Returns [`SchemaError::MissingProperty`] if the layout and the canonical
/// models disagree
pub fn relaxed_schema(form: FormKind) -> Result<Value, SchemaError> {
    let mut root = canonical_map(form)?;
    for_each_entity(form, &mut root, apply_layout)?;
    Ok(Value::Object(root))
}

fn apply_layout(form: FormKind, schema: &mut Map<String, Value>) -> Result<(), SchemaError> {
    let mut renames: Vec<(&str, &str)> = Vec::new();
    let mut removed: Vec<&str> = Vec::new();

    let properties = match schema.get_mut("properties") {
        Some(Value::Object(properties)) => properties,
        _ => return Ok(()),
    };

    for target in flatten_targets(form) {
        let Some(Value::Object(mut sequence)) = properties.remove(target.canonical_key) else {
            return Err(SchemaError::MissingProperty {
                form,
                property: target.canonical_key,
            });
        };
        let mut element = match sequence.remove("items") {
            Some(Value::Object(items)) => items,
            _ => {
                return Err(SchemaError::MissingProperty {
                    form,
                    property: target.canonical_key,
                })
            }
        };
        if let Some(description) = sequence.remove("description") {
            element.insert("description".to_owned(), description);
        }
        properties.insert(target.relaxed_key.to_owned(), Value::Object(element));
        renames.push((target.canonical_key, target.relaxed_key));
    }

    for key in hidden_fields(form) {
        if properties.remove(key).is_none() {
            return Err(SchemaError::MissingProperty { form, property: key });
        }
        removed.push(key);
    }

    if let Some(Value::Array(required)) = schema.get_mut("required") {
        required.retain(|name| !removed.iter().any(|key| name.as_str() == Some(*key)));
        for name in required.iter_mut() {
            if let Some((_, relaxed)) = renames.iter().find(|(canonical, _)| name.as_str() == Some(*canonical)) {
                *name = Value::String((*relaxed).to_owned());
            }
        }
    }

    Ok(())
}

/// A compiled schema that reports field violations
pub struct CompiledSchema {
    form: FormKind,
    tier: SchemaTier,
    document: Value,
    validator: JSONSchema,
}

impl CompiledSchema {
    /// Compile a schema document
    ///
    /// # Errors
    /// Returns [`SchemaError::Compile`] when the document is not a valid schema
    pub fn compile(form: FormKind, tier: SchemaTier, document: Value) -> Result<Self, SchemaError> {
        let validator = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&document)
            .map_err(|err| SchemaError::Compile {
                form,
                tier,
                message: err.to_string(),
            })?;
        Ok(Self {
            form,
            tier,
            document,
            validator,
        })
    }

    #[inline]
    #[must_use]
    pub fn form(&self) -> FormKind {
        self.form
    }

    #[inline]
    #[must_use]
    pub fn tier(&self) -> SchemaTier {
        self.tier
    }

    /// Schema document, for renderers
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Every violation of this schema, in validator order
    #[must_use]
    pub fn check(&self, instance: &Value) -> Vec<FieldViolation> {
        match self.validator.validate(instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.map(|error| to_violation(&error)).collect(),
        }
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("form", &self.form)
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}

fn to_violation(error: &ValidationError<'_>) -> FieldViolation {
    let path = error.instance_path.to_string();
    let message = error.to_string();
    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map_or_else(|| property.to_string(), str::to_owned);
            FieldViolation::new(join_path(&path, name), ViolationKind::RequiredMissing, message)
        }
        ValidationErrorKind::Type { .. } => FieldViolation::new(path, ViolationKind::TypeMismatch, message),
        ValidationErrorKind::MinItems { .. }
        | ValidationErrorKind::MaxItems { .. }
        | ValidationErrorKind::MinLength { .. }
        | ValidationErrorKind::MaxLength { .. }
        | ValidationErrorKind::MinProperties { .. }
        | ValidationErrorKind::MaxProperties { .. }
        | ValidationErrorKind::Minimum { .. }
        | ValidationErrorKind::Maximum { .. }
        | ValidationErrorKind::ExclusiveMinimum { .. }
        | ValidationErrorKind::ExclusiveMaximum { .. } => {
            FieldViolation::new(path, ViolationKind::OutOfRange, message)
        }
        _ => FieldViolation::new(path, ViolationKind::InvalidValue, message),
    }
}

/// Both tiers of one form
#[derive(Debug)]
pub struct FormSchema {
    kind: FormKind,
    relaxed: CompiledSchema,
    canonical: CompiledSchema,
    fields: BTreeSet<String>,
}

impl FormSchema {
    /// Generate, derive and compile both tiers
    ///
    /// # Errors
    /// Propagates generation and compilation failures
    pub fn build(kind: FormKind) -> Result<Self, SchemaError> {
        let relaxed = relaxed_schema(kind)?;
        let fields = relaxed
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default();

        Ok(Self {
            kind,
            relaxed: CompiledSchema::compile(kind, SchemaTier::Relaxed, relaxed)?,
            canonical: CompiledSchema::compile(kind, SchemaTier::Canonical, canonical_schema(kind)?)?,
            fields,
        })
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> FormKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn relaxed(&self) -> &CompiledSchema {
        &self.relaxed
    }

    #[inline]
    #[must_use]
    pub fn canonical(&self) -> &CompiledSchema {
        &self.canonical
    }

    #[inline]
    #[must_use]
    pub fn tier(&self, tier: SchemaTier) -> &CompiledSchema {
        match tier {
            SchemaTier::Relaxed => &self.relaxed,
            SchemaTier::Canonical => &self.canonical,
        }
    }

    /// Top-level keys the form accepts
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }
}

/// Compiled schemas for every form
#[derive(Debug)]
pub struct FormSchemas {
    forms: Vec<FormSchema>,
}

impl FormSchemas {
    /// Build every form's schemas
    ///
    /// # Errors
    /// Propagates the first form that fails to build
    pub fn build() -> Result<Self, SchemaError> {
        let forms = FormKind::ALL
            .into_iter()
            .map(FormSchema::build)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { forms })
    }

    /// Schemas of one form
    #[inline]
    #[must_use]
    pub fn get(&self, kind: FormKind) -> &FormSchema {
        &self.forms[kind.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn required(schema: &Value) -> Vec<&str> {
        schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect()
    }

    #[test]
    fn upload_job_form_collapses_modalities() {
        let schema = relaxed_schema(FormKind::UploadJob).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("modality"));
        assert!(!properties.contains_key("modalities"));
        assert_eq!(properties["modality"]["$ref"], json!("#/definitions/ModalityConfigs"));

        let required = required(&schema);
        assert!(required.contains(&"modality"));
        assert!(!required.contains(&"modalities"));
    }

    #[test]
    fn nested_definitions_follow_their_own_layout() {
        let schema = relaxed_schema(FormKind::SubmitJob).unwrap();
        assert!(schema["properties"]["upload_job"].is_object());

        let job = &schema["definitions"]["BasicUploadJobConfigs"];
        assert!(job["properties"]["modality"].is_object());
        assert!(job["properties"].get("modalities").is_none());

        let modality = &schema["definitions"]["ModalityConfigs"];
        assert!(modality["properties"].get("job_settings").is_none());
    }

    #[test]
    fn canonical_schema_is_untouched() {
        let schema = canonical_schema(FormKind::Modality).unwrap();
        assert!(schema["properties"].get("job_settings").is_some());
        assert!(schema["properties"].get("output_folder_name").is_none());
    }

    #[test]
    fn relaxed_form_publishes_notification_default() {
        let schema = relaxed_schema(FormKind::SubmitJob).unwrap();
        assert_eq!(schema["properties"]["email_notification_types"]["default"], json!(["fail"]));
    }

    #[test]
    fn relaxed_enumerations_equal_canonical() {
        for kind in FormKind::ALL {
            let relaxed = relaxed_schema(kind).unwrap();
            let canonical = canonical_schema(kind).unwrap();
            for name in ["Modality", "Platform", "BucketType", "EmailNotificationType"] {
                assert_eq!(relaxed["definitions"][name], canonical["definitions"][name], "{kind} {name}");
            }
        }
    }

    #[test]
    fn check_reports_required_with_field_path() {
        let schemas = FormSchema::build(FormKind::Modality).unwrap();
        let violations = schemas.relaxed().check(&json!({"modality": "ECEPHYS"}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "/source");
        assert_eq!(violations[0].kind, ViolationKind::RequiredMissing);
    }

    #[test]
    fn check_classifies_type_and_range() {
        let schemas = FormSchema::build(FormKind::Modality).unwrap();
        let violations = schemas
            .relaxed()
            .check(&json!({"modality": "ECEPHYS", "source": "", "compress_raw_data": "yes"}));
        let kinds: Vec<_> = violations.iter().map(|v| (v.path.as_str(), v.kind)).collect();
        assert!(kinds.contains(&("/source", ViolationKind::OutOfRange)));
        assert!(kinds.contains(&("/compress_raw_data", ViolationKind::TypeMismatch)));
    }

    #[test]
    fn check_rejects_unknown_choice() {
        let schemas = FormSchema::build(FormKind::Modality).unwrap();
        let violations = schemas.relaxed().check(&json!({"modality": "XRAY", "source": "/data"}));
        assert_eq!(violations[0].path, "/modality");
        assert_eq!(violations[0].kind, ViolationKind::InvalidValue);
    }

    #[test]
    fn form_fields_are_relaxed_keys() {
        let schemas = FormSchemas::build().unwrap();
        let fields = schemas.get(FormKind::UploadJob).fields();
        assert!(fields.contains("modality"));
        assert!(fields.contains("project_name"));
        assert!(!fields.contains("modalities"));
        assert!(!fields.contains("s3_prefix"));
    }
}
