//! Field-level validation failures
//!
//! Paths are JSON pointers into the submitted record
//! (`/upload_jobs/0/subject_id`); the empty path is the record itself.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rule a field violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Required field absent
    RequiredMissing,
    /// Wrong JSON type
    TypeMismatch,
    /// Length or numeric bound exceeded
    OutOfRange,
    /// Value outside the accepted set or format
    InvalidValue,
    /// Rule spanning several fields
    CrossFieldInvalid,
}

impl ViolationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequiredMissing => "required_missing",
            Self::TypeMismatch => "type_mismatch",
            Self::OutOfRange => "out_of_range",
            Self::InvalidValue => "invalid_value",
            Self::CrossFieldInvalid => "cross_field_invalid",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// JSON pointer to the offending field
    pub path: String,
    /// Rule the field violated
    pub kind: ViolationKind,
    /// Human-readable reason
    pub message: String,
}

impl FieldViolation {
    pub fn new(path: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn required(path: impl Into<String>) -> Self {
        Self::new(path, ViolationKind::RequiredMissing, "field required")
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{path} [{}]: {}", self.kind, self.message)
    }
}

/// Append a segment to a JSON pointer
#[must_use]
pub fn join_path(parent: &str, segment: impl fmt::Display) -> String {
    format!("{parent}/{segment}")
}

/// Every violation found while constructing a canonical record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{} field violation(s): {}", .violations.len(), summarize(.violations))]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: FieldViolation) {
        self.violations.push(violation);
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, FieldViolation> {
        self.violations.iter()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[FieldViolation] {
        &self.violations
    }

    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<FieldViolation> {
        self.violations
    }

    /// Whether any violation sits at `path`
    #[must_use]
    pub fn has_path(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }

    /// `Ok(value)` when no violations were collected
    ///
    /// # Errors
    /// Returns `self` when it holds at least one violation
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<Vec<FieldViolation>> for ValidationErrors {
    fn from(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }
}

impl From<FieldViolation> for ValidationErrors {
    fn from(violation: FieldViolation) -> Self {
        Self {
            violations: vec![violation],
        }
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldViolation;
    type IntoIter = std::slice::Iter<'a, FieldViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}
