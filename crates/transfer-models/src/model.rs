//! Canonical model contract

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::violation::{FieldViolation, ValidationErrors};

/// A canonical, business-rule-enforcing record
///
/// Deserialization checks shape and field types; `finalize` applies the
/// rules serde cannot express: cross-field defaults, computed fields and
/// cross-field constraints.
///
/// # Contract
/// - `finalize` is deterministic: finalizing an already-finalized record
///   leaves it unchanged
/// - violations are reported relative to `path`, a JSON pointer to the
///   record inside the submission
pub trait CanonicalModel: Serialize + DeserializeOwned + JsonSchema + Sized {
    /// Apply defaults and computed fields, collecting rule violations
    fn finalize(&mut self, path: &str, violations: &mut Vec<FieldViolation>);

    /// Finalize a top-level record
    ///
    /// # Errors
    /// Returns every violation found when any rule fails
    fn finalized(mut self) -> Result<Self, ValidationErrors> {
        let mut violations = Vec::new();
        self.finalize("", &mut violations);
        ValidationErrors::from(violations).into_result(self)
    }
}
