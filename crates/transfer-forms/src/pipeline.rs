//! Submission pipeline
//!
//! normalize (inside relaxed parsing) → lift → validate, per form. The
//! pipeline holds only compiled schemas and configuration, so one instance
//! serves any number of submissions by shared reference.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use tracing::{debug, info, info_span, warn};
use transfer_models::{FieldViolation, ValidationErrors};
use ulid::Ulid;

use crate::config::{FailureMode, PipelineConfig, MAX_OUTPUT_INDENT};
use crate::entity::FormKind;
use crate::error::{PipelineError, SchemaError, ShapeError};
use crate::lift::{lift, LiftedForm};
use crate::relaxed::RelaxedForm;
use crate::schema::FormSchemas;
use crate::validator::{CanonicalValidator, Validated};

/// Every stage's output for one accepted submission
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub form: RelaxedForm,
    pub lifted: LiftedForm,
    pub validated: Validated,
}

/// Form normalization and validation pipeline
#[derive(Debug)]
pub struct FormPipeline {
    config: PipelineConfig,
    schemas: FormSchemas,
}

impl FormPipeline {
    /// Build the pipeline, compiling every form's schemas
    ///
    /// # Errors
    /// Returns [`SchemaError`] if a schema cannot be generated or compiled
    pub fn new(config: PipelineConfig) -> Result<Self, SchemaError> {
        let schemas = FormSchemas::build()?;
        debug!(failure_mode = %config.failure_mode, "form schemas compiled");
        Ok(Self { config, schemas })
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn schemas(&self) -> &FormSchemas {
        &self.schemas
    }

    /// Parse raw data into a relaxed form
    ///
    /// # Errors
    /// Returns [`ShapeError`] when the input does not fit the form
    pub fn parse(&self, kind: FormKind, raw: Value) -> Result<RelaxedForm, ShapeError> {
        RelaxedForm::parse(&self.schemas, kind, raw)
    }

    /// Validate a canonical record directly, without lifting
    ///
    /// # Errors
    /// Returns the field violations that rejected the record
    pub fn validate_canonical(&self, kind: FormKind, value: &Value) -> Result<Validated, ValidationErrors> {
        CanonicalValidator::new(&self.schemas).validate(kind, value)
    }

    /// Run one submission through every stage
    ///
    /// # Errors
    /// Returns the first stage's failure
    pub fn run(&self, kind: FormKind, raw: Value) -> Result<Submission, PipelineError> {
        let span = info_span!("submission", form = %kind, submission_id = %Ulid::new());
        let _enter = span.enter();

        let (form, lifted) = self.parse_and_lift(kind, raw)?;
        let validated = self.validate_lifted(&lifted)?;
        info!("submission validated");

        Ok(Submission {
            form,
            lifted,
            validated,
        })
    }

    /// Run a JSON document through every stage
    ///
    /// # Errors
    /// As [`FormPipeline::run`], plus [`ShapeError::Syntax`] for malformed JSON
    pub fn run_str(&self, kind: FormKind, text: &str) -> Result<Submission, PipelineError> {
        self.run(kind, parse_json(kind, text)?)
    }

    /// Run a submission and build the echo shown to the submitter
    ///
    /// Canonical rejection is absorbed here according to the failure mode;
    /// shape and lift errors are returned.
    ///
    /// # Errors
    /// Returns [`PipelineError::Shape`] or [`PipelineError::Lift`]
    pub fn respond(&self, kind: FormKind, raw: Value) -> Result<FormResponse, PipelineError> {
        let span = info_span!("submission", form = %kind, submission_id = %Ulid::new());
        let _enter = span.enter();

        let (form, lifted) = self.parse_and_lift(kind, raw)?;
        let submitted = form.to_value();

        match self.validate_lifted(&lifted) {
            Ok(validated) => {
                info!("submission validated");
                Ok(FormResponse {
                    form: kind,
                    submitted,
                    validated: Some(validated.payload),
                    violations: Vec::new(),
                })
            }
            Err(PipelineError::CanonicalRejection(errors)) => {
                let violations = match self.config.failure_mode {
                    FailureMode::Omit => {
                        warn!(%errors, "omitting validated payload");
                        Vec::new()
                    }
                    FailureMode::Detailed => errors.into_vec(),
                };
                Ok(FormResponse {
                    form: kind,
                    submitted,
                    validated: None,
                    violations,
                })
            }
            Err(other) => Err(other),
        }
    }

    /// As [`FormPipeline::respond`], from a JSON document
    ///
    /// # Errors
    /// As [`FormPipeline::respond`], plus [`ShapeError::Syntax`] for malformed JSON
    pub fn respond_str(&self, kind: FormKind, text: &str) -> Result<FormResponse, PipelineError> {
        self.respond(kind, parse_json(kind, text)?)
    }

    fn parse_and_lift(&self, kind: FormKind, raw: Value) -> Result<(RelaxedForm, LiftedForm), PipelineError> {
        let form = self.parse(kind, raw).map_err(|err| {
            debug!(error = %err, "relaxed parse rejected submission");
            err
        })?;
        debug!(fields = form.fields().len(), "relaxed form parsed");

        let lifted = lift(&form)?;
        debug!("relaxed form lifted");
        Ok((form, lifted))
    }

    fn validate_lifted(&self, lifted: &LiftedForm) -> Result<Validated, PipelineError> {
        let mapping = Value::Object(lifted.fields().clone());
        self.validate_canonical(lifted.kind(), &mapping).map_err(|errors| {
            warn!(violations = errors.len(), "canonical validation rejected submission");
            PipelineError::CanonicalRejection(errors)
        })
    }
}

fn parse_json(kind: FormKind, text: &str) -> Result<Value, ShapeError> {
    serde_json::from_str(text).map_err(|err| ShapeError::Syntax {
        form: kind,
        message: err.to_string(),
    })
}

/// Echo of one submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormResponse {
    pub form: FormKind,
    /// Relaxed record as parsed
    pub submitted: Value,
    /// Canonical payload, absent when validation failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated: Option<Value>,
    /// Field violations, only filled in detailed failure mode
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<FieldViolation>,
}

impl FormResponse {
    #[inline]
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.validated.is_some()
    }

    /// Human-readable echo
    ///
    /// # Errors
    /// Propagates JSON rendering failures
    pub fn render_text(&self, indent: usize) -> Result<String, serde_json::Error> {
        let mut out = String::from("Submitted form content!\n\nForm data:\n");
        out.push_str(&to_pretty_json(&self.submitted, indent)?);
        out.push('\n');

        if let Some(validated) = &self.validated {
            out.push_str("\nSubmit to server (validated):\n");
            out.push_str(&to_pretty_json(validated, indent)?);
            out.push('\n');
        } else if !self.violations.is_empty() {
            out.push_str("\nValidation failed:\n");
            for violation in &self.violations {
                out.push_str("  ");
                out.push_str(&violation.to_string());
                out.push('\n');
            }
        }
        Ok(out)
    }
}

/// Pretty-print JSON with a configurable indent width, at most
/// [`MAX_OUTPUT_INDENT`] spaces
///
/// # Errors
/// Propagates serialization failures
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T, indent: usize) -> Result<String, serde_json::Error> {
    let indent = vec![b' '; indent.min(MAX_OUTPUT_INDENT)];
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(&indent));
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
