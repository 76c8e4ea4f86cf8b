//! Upload job configuration

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::choices::{BucketType, Choice, EmailNotificationType, Modality, Platform};
use crate::datetime::AcqDateTime;
use crate::model::CanonicalModel;
use crate::modality::ModalityConfigs;
use crate::violation::{join_path, FieldViolation, ViolationKind};

/// Upper bound on modalities per job
pub const MAX_MODALITIES: usize = 1000;

static SUBJECT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[^<>:;"/|?\\ _]+$"#).expect("subject id pattern compiles"));

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

/// Check an optional email address
pub(crate) fn check_email(email: Option<&str>, path: &str, violations: &mut Vec<FieldViolation>) {
    if let Some(email) = email {
        if !EMAIL.is_match(email) {
            violations.push(FieldViolation::new(
                join_path(path, "user_email"),
                ViolationKind::InvalidValue,
                format!("'{email}' is not a valid email address"),
            ));
        }
    }
}

/// One upload job: a subject's session on a platform, with its modalities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BasicUploadJobConfigs {
    /// Optional email address to receive job status notifications
    pub user_email: Option<String>,

    /// Types of job statuses to receive email notifications about
    pub email_notification_types: Option<BTreeSet<EmailNotificationType>>,

    /// Name of project
    #[schemars(length(min = 1))]
    pub project_name: String,

    /// (deprecated - set codeocean_configs)
    pub input_data_mount: Option<String>,

    /// (deprecated - set codeocean_configs)
    pub process_capsule_id: Option<String>,

    /// Bucket where data will be uploaded
    #[serde(default)]
    pub s3_bucket: BucketType,

    /// Platform
    pub platform: Platform,

    /// Data collection modalities and their directory location
    #[schemars(length(min = 1, max = 1000))]
    pub modalities: Vec<ModalityConfigs>,

    /// Subject ID
    #[schemars(length(min = 1))]
    pub subject_id: String,

    /// Datetime data was acquired
    pub acq_datetime: AcqDateTime,

    /// Directory of metadata
    pub metadata_dir: Option<String>,

    /// Whether to override metadata from service with metadata in optional metadata directory
    #[serde(default)]
    pub metadata_dir_force: bool,

    /// Force syncing of data folder even if location exists in cloud
    #[serde(default)]
    pub force_cloud_sync: bool,

    /// Computed upload prefix; any submitted value is replaced
    #[serde(default)]
    #[schemars(skip)]
    pub s3_prefix: String,
}

impl BasicUploadJobConfigs {
    /// `{platform}_{subject_id}_{acquisition stamp}`
    #[must_use]
    pub fn compute_s3_prefix(&self) -> String {
        format!(
            "{}_{}_{}",
            self.platform.abbreviation(),
            self.subject_id,
            self.acq_datetime.prefix_stamp()
        )
    }
}

impl CanonicalModel for BasicUploadJobConfigs {
    fn finalize(&mut self, path: &str, violations: &mut Vec<FieldViolation>) {
        check_email(self.user_email.as_deref(), path, violations);

        if self.project_name.trim().is_empty() {
            violations.push(FieldViolation::new(
                join_path(path, "project_name"),
                ViolationKind::InvalidValue,
                "project_name must not be blank",
            ));
        }

        if !SUBJECT_ID.is_match(&self.subject_id) {
            violations.push(FieldViolation::new(
                join_path(path, "subject_id"),
                ViolationKind::InvalidValue,
                format!(
                    "subject_id '{}' must not contain spaces, underscores or any of <>:;\"/|?\\",
                    self.subject_id
                ),
            ));
        }

        let modalities_path = join_path(path, "modalities");
        let mut seen: BTreeMap<Modality, usize> = BTreeMap::new();
        for (index, modality) in self.modalities.iter_mut().enumerate() {
            let entry_path = join_path(&modalities_path, index);
            modality.finalize(&entry_path, violations);
            if let Some(first) = seen.insert(modality.modality, index) {
                violations.push(FieldViolation::new(
                    entry_path,
                    ViolationKind::CrossFieldInvalid,
                    format!(
                        "modality '{}' already configured at modalities[{first}]",
                        modality.modality
                    ),
                ));
            }
        }

        self.s3_prefix = self.compute_s3_prefix();
    }
}
