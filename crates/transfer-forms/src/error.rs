//! Error types for the form pipeline
//!
//! Provides error handling for:
//! - Shape errors (raw input → relaxed form)
//! - Lift inconsistencies (relaxed form → canonical mapping)
//! - Canonical rejection (canonical mapping → validated record)
//! - Schema generation and configuration loading
//!
//! Every failure is scoped to the submission being processed.

use std::path::PathBuf;

use serde_json::Value;
use transfer_models::{FieldViolation, ValidationErrors};

use crate::entity::FormKind;
use crate::schema::SchemaTier;

/// Raw input could not be parsed into the relaxed form
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    /// Input text is not JSON
    #[error("{form} form is not valid JSON: {message}")]
    Syntax { form: FormKind, message: String },

    /// Input is JSON but not an object
    #[error("{form} form must be a JSON object, found {found}")]
    NotAnObject { form: FormKind, found: &'static str },

    /// Relaxed schema rejected the normalized input
    #[error("{form} form rejected: {violations}")]
    Rejected {
        form: FormKind,
        violations: ValidationErrors,
    },
}

impl ShapeError {
    /// Create a rejection from collected violations
    pub fn rejected(form: FormKind, violations: impl Into<ValidationErrors>) -> Self {
        Self::Rejected {
            form,
            violations: violations.into(),
        }
    }

    /// Form the input was submitted for
    #[must_use]
    pub fn form(&self) -> FormKind {
        match self {
            Self::Syntax { form, .. } | Self::NotAnObject { form, .. } | Self::Rejected { form, .. } => *form,
        }
    }

    /// Field-level detail, when the relaxed schema produced any
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Rejected { violations, .. } => violations.as_slice(),
            _ => &[],
        }
    }
}

/// Relaxed form could not be lifted
///
/// Only reachable when a relaxed form bypassed relaxed-schema parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiftError {
    /// Singular value is not an object
    #[error("{path}: expected an object to lift into '{canonical_key}', found {found}")]
    NotAnObject {
        path: String,
        canonical_key: &'static str,
        found: &'static str,
    },

    /// Sequence key already present next to its singular key
    #[error("{path}: '{canonical_key}' already present alongside '{relaxed_key}'")]
    Collision {
        path: String,
        relaxed_key: &'static str,
        canonical_key: &'static str,
    },
}

/// Schema generation or compilation failed
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Canonical schema could not be rendered as JSON
    #[error("failed to render {form} schema: {source}")]
    Render {
        form: FormKind,
        #[source]
        source: serde_json::Error,
    },

    /// Form layout names a property the canonical schema lacks
    #[error("{form} schema has no property '{property}'")]
    MissingProperty { form: FormKind, property: &'static str },

    /// Schema failed to compile
    #[error("failed to compile {tier} schema for {form}: {message}")]
    Compile {
        form: FormKind,
        tier: SchemaTier,
        message: String,
    },
}

/// Submission failed somewhere in the pipeline
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// Relaxed parse failed
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    /// Lift contract violated
    #[error("lift error: {0}")]
    Lift(#[from] LiftError),

    /// Canonical models rejected the lifted form
    #[error("canonical validation failed: {0}")]
    CanonicalRejection(#[from] ValidationErrors),
}

impl PipelineError {
    /// Whether resubmitting corrected input can succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Shape(_) | Self::CanonicalRejection(_))
    }

    /// Whether this is a bad-request style failure
    #[inline]
    #[must_use]
    pub fn is_shape_error(&self) -> bool {
        matches!(self, Self::Shape(_))
    }

    /// Field-level detail carried by the failure
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Shape(err) => err.violations(),
            Self::Lift(_) => &[],
            Self::CanonicalRejection(errors) => errors.as_slice(),
        }
    }
}

/// Configuration could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML config did not parse
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON config did not parse
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file holds an out-of-range value
    #[error("invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    /// Environment variable holds an unusable value
    #[error("invalid value '{value}' for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// JSON type name for messages
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transfer_models::ViolationKind;

    #[test]
    fn retryable_classification() {
        let shape = PipelineError::from(ShapeError::NotAnObject {
            form: FormKind::Modality,
            found: "array",
        });
        assert!(shape.is_retryable());
        assert!(shape.is_shape_error());

        let lift = PipelineError::from(LiftError::Collision {
            path: String::new(),
            relaxed_key: "modality",
            canonical_key: "modalities",
        });
        assert!(!lift.is_retryable());

        let rejected = PipelineError::from(ValidationErrors::from(FieldViolation::required("/x")));
        assert!(rejected.is_retryable());
        assert_eq!(rejected.violations().len(), 1);
    }

    #[test]
    fn shape_rejection_exposes_violations() {
        let err = ShapeError::rejected(
            FormKind::UploadJob,
            FieldViolation::new("/platform", ViolationKind::InvalidValue, "unknown"),
        );
        assert_eq!(err.form(), FormKind::UploadJob);
        assert_eq!(err.violations()[0].path, "/platform");
        assert!(err.to_string().starts_with("upload-job form rejected"));
    }

    #[test]
    fn json_type_names() {
        assert_eq!(json_type_name(&Value::Null), "null");
        assert_eq!(json_type_name(&serde_json::json!([1])), "array");
    }
}
