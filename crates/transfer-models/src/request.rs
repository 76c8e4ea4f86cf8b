//! Job submission request

use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::choices::EmailNotificationType;
use crate::model::CanonicalModel;
use crate::upload_job::{check_email, BasicUploadJobConfigs};
use crate::violation::{join_path, FieldViolation, ViolationKind};

/// Upper bound on upload jobs per request
pub const MAX_UPLOAD_JOBS: usize = 1000;

/// Job type tag sent downstream
pub const DEFAULT_JOB_TYPE: &str = "transform_and_upload";

fn default_job_type() -> String {
    DEFAULT_JOB_TYPE.to_owned()
}

fn default_notification_types() -> BTreeSet<EmailNotificationType> {
    BTreeSet::from([EmailNotificationType::Fail])
}

/// A batch of upload jobs with request-wide notification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubmitJobRequest {
    /// Job type tag
    #[serde(default = "default_job_type")]
    pub job_type: String,

    /// Upload jobs to process
    #[schemars(length(min = 1, max = 1000))]
    pub upload_jobs: Vec<BasicUploadJobConfigs>,

    /// Optional email address to receive job status notifications
    pub user_email: Option<String>,

    /// Types of job statuses to receive email notifications about
    #[serde(default = "default_notification_types")]
    pub email_notification_types: BTreeSet<EmailNotificationType>,
}

impl CanonicalModel for SubmitJobRequest {
    fn finalize(&mut self, path: &str, violations: &mut Vec<FieldViolation>) {
        check_email(self.user_email.as_deref(), path, violations);

        let jobs_path = join_path(path, "upload_jobs");
        let mut prefixes: BTreeMap<String, usize> = BTreeMap::new();
        for (index, job) in self.upload_jobs.iter_mut().enumerate() {
            // Request-level settings fill in whatever a job leaves unset
            if job.user_email.is_none() {
                job.user_email.clone_from(&self.user_email);
            }
            if job.email_notification_types.is_none() {
                job.email_notification_types = Some(self.email_notification_types.clone());
            }

            let job_path = join_path(&jobs_path, index);
            job.finalize(&job_path, violations);

            if let Some(first) = prefixes.insert(job.s3_prefix.clone(), index) {
                violations.push(FieldViolation::new(
                    job_path,
                    ViolationKind::CrossFieldInvalid,
                    format!(
                        "duplicate upload job: s3 prefix '{}' already used by upload_jobs[{first}]",
                        job.s3_prefix
                    ),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn job(subject: &str) -> serde_json::Value {
        json!({
            "project_name": "Ephys Platform",
            "platform": "ecephys",
            "modalities": [{"modality": "ecephys", "source": "/data/x"}],
            "subject_id": subject,
            "acq_datetime": "2024-03-01 12:30:00",
        })
    }

    fn request(jobs: Vec<serde_json::Value>) -> SubmitJobRequest {
        serde_json::from_value(json!({
            "upload_jobs": jobs,
            "user_email": "someone@example.org",
        }))
        .unwrap()
    }

    #[test]
    fn defaults() {
        let request = request(vec![job("1")]);
        assert_eq!(request.job_type, DEFAULT_JOB_TYPE);
        assert_eq!(request.email_notification_types, default_notification_types());
    }

    #[test]
    fn propagates_email_settings_to_jobs() {
        let request = request(vec![job("1")]).finalized().unwrap();
        let job = &request.upload_jobs[0];
        assert_eq!(job.user_email.as_deref(), Some("someone@example.org"));
        assert_eq!(
            job.email_notification_types,
            Some(BTreeSet::from([EmailNotificationType::Fail]))
        );
    }

    #[test]
    fn job_settings_win_over_request_settings() {
        let mut with_email = job("1");
        with_email["user_email"] = json!("owner@example.org");
        with_email["email_notification_types"] = json!(["end"]);

        let request = request(vec![with_email]).finalized().unwrap();
        let job = &request.upload_jobs[0];
        assert_eq!(job.user_email.as_deref(), Some("owner@example.org"));
        assert_eq!(
            job.email_notification_types,
            Some(BTreeSet::from([EmailNotificationType::End]))
        );
    }

    #[test]
    fn rejects_duplicate_upload_jobs() {
        let errors = request(vec![job("1"), job("2"), job("1")]).finalized().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.as_slice()[0].path, "/upload_jobs/2");
        assert_eq!(errors.as_slice()[0].kind, ViolationKind::CrossFieldInvalid);
    }

    #[test]
    fn nested_job_violations_carry_index() {
        let errors = request(vec![job("1"), job("bad id")]).finalized().unwrap_err();
        assert!(errors.has_path("/upload_jobs/1/subject_id"));
    }

    #[test]
    fn schema_bounds_upload_jobs() {
        let schema = serde_json::to_value(schemars::schema_for!(SubmitJobRequest)).unwrap();
        let jobs = &schema["properties"]["upload_jobs"];
        assert_eq!(jobs["minItems"], json!(1));
        assert_eq!(jobs["maxItems"], json!(MAX_UPLOAD_JOBS));
        assert!(schema["required"]
            .as_array()
            .unwrap()
            .contains(&json!("upload_jobs")));
    }
}
