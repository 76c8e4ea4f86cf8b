//! Testing utilities for transfer-forms workspace
//!
//! Shared fixtures for relaxed and canonical submissions.

#![allow(missing_docs)]

use serde_json::{json, Value};
use transfer_forms::{FailureMode, FormPipeline, PipelineConfig};

pub const SOURCE: &str = "/data/x";
pub const SUBJECT_ID: &str = "123456";
pub const ACQ_DATETIME: &str = "2024-03-01 12:30:00";

pub fn relaxed_modality() -> Value {
    json!({"modality": "ECEPHYS", "source": SOURCE})
}

pub fn relaxed_upload_job() -> Value {
    json!({
        "project_name": "Ephys Platform",
        "platform": "ECEPHYS",
        "modality": relaxed_modality(),
        "subject_id": SUBJECT_ID,
        "acq_datetime": ACQ_DATETIME,
    })
}

pub fn relaxed_upload_job_for(subject_id: &str) -> Value {
    let mut job = relaxed_upload_job();
    job["subject_id"] = json!(subject_id);
    job
}

pub fn relaxed_submit_job() -> Value {
    json!({
        "user_email": "someone@example.org",
        "upload_job": relaxed_upload_job(),
    })
}

pub fn canonical_upload_job() -> Value {
    json!({
        "project_name": "Ephys Platform",
        "platform": "ecephys",
        "modalities": [{"modality": "ecephys", "source": SOURCE}],
        "subject_id": SUBJECT_ID,
        "acq_datetime": ACQ_DATETIME,
    })
}

pub fn canonical_submit_job(jobs: Vec<Value>) -> Value {
    json!({"upload_jobs": jobs})
}

pub fn pipeline() -> FormPipeline {
    FormPipeline::new(PipelineConfig::default()).unwrap()
}

pub fn detailed_pipeline() -> FormPipeline {
    FormPipeline::new(PipelineConfig::default().with_failure_mode(FailureMode::Detailed)).unwrap()
}

/// Remove a top-level key from an object fixture
pub fn without(mut value: Value, key: &str) -> Value {
    if let Some(fields) = value.as_object_mut() {
        fields.remove(key);
    }
    value
}
