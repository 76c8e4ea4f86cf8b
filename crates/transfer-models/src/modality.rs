//! Modality configuration

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::choices::{Choice, Modality};
use crate::model::CanonicalModel;
use crate::violation::{join_path, FieldViolation, ViolationKind};

/// One data collection modality and where its raw data lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModalityConfigs {
    /// Data collection modality
    pub modality: Modality,

    /// Location of raw data to be uploaded
    #[schemars(length(min = 1))]
    pub source: String,

    /// Run compression on data
    pub compress_raw_data: Option<bool>,

    /// Location of additional configuration file for compression job
    pub extra_configs: Option<String>,

    /// Configs to pass into modality compression job. Must be a JSON object.
    pub job_settings: Option<Value>,

    /// Computed from the modality; any submitted value is replaced
    #[serde(default)]
    #[schemars(skip)]
    pub output_folder_name: String,
}

impl ModalityConfigs {
    #[must_use]
    pub fn new(modality: Modality, source: impl Into<String>) -> Self {
        Self {
            modality,
            source: source.into(),
            compress_raw_data: None,
            extra_configs: None,
            job_settings: None,
            output_folder_name: String::new(),
        }
    }
}

impl CanonicalModel for ModalityConfigs {
    fn finalize(&mut self, path: &str, violations: &mut Vec<FieldViolation>) {
        if self.compress_raw_data.is_none() {
            self.compress_raw_data = Some(self.modality.compresses_by_default());
        }

        if let Some(settings) = &self.job_settings {
            if !settings.is_object() {
                violations.push(FieldViolation::new(
                    join_path(path, "job_settings"),
                    ViolationKind::TypeMismatch,
                    "job_settings must be a JSON object",
                ));
            } else if self.extra_configs.is_some() {
                violations.push(FieldViolation::new(
                    path,
                    ViolationKind::CrossFieldInvalid,
                    "only one of job_settings or extra_configs may be set",
                ));
            }
        }

        self.output_folder_name = self.modality.abbreviation().to_owned();
    }
}
