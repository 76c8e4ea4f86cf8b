use pretty_assertions::assert_eq;
use serde_json::json;
use transfer_forms::{CanonicalRecord, FormKind, PipelineError, ShapeError};
use transfer_models::{EmailNotificationType, ViolationKind};
use transfer_test_utils::{
    detailed_pipeline, pipeline, relaxed_modality, relaxed_submit_job, relaxed_upload_job,
    relaxed_upload_job_for, without,
};

#[test]
fn single_modality_lifts_into_sequence_and_validates() {
    let submission = pipeline().run(FormKind::UploadJob, relaxed_upload_job()).unwrap();

    assert_eq!(
        submission.lifted.fields()["modalities"],
        json!([{"modality": "ECEPHYS", "source": "/data/x"}])
    );
    assert!(!submission.lifted.fields().contains_key("modality"));

    let CanonicalRecord::UploadJob(job) = &submission.validated.record else {
        panic!("expected an upload job record");
    };
    assert_eq!(job.modalities.len(), 1);
    assert_eq!(job.modalities[0].source, "/data/x");
    assert_eq!(job.s3_prefix, "ecephys_123456_2024-03-01_12-30-00");
}

#[test]
fn bare_notification_type_is_normalized_before_lifting() {
    let mut raw = relaxed_upload_job();
    raw["email_notification_types"] = json!("fail");

    let submission = pipeline().run(FormKind::UploadJob, raw).unwrap();
    assert_eq!(submission.form.fields()["email_notification_types"], json!(["fail"]));
    assert_eq!(submission.lifted.fields()["email_notification_types"], json!(["fail"]));

    let CanonicalRecord::UploadJob(job) = submission.validated.record else {
        panic!("expected an upload job record");
    };
    assert_eq!(
        job.email_notification_types.unwrap().into_iter().collect::<Vec<_>>(),
        vec![EmailNotificationType::Fail]
    );
}

#[test]
fn missing_project_name_fails_before_lifting() {
    let err = pipeline()
        .run(FormKind::UploadJob, without(relaxed_upload_job(), "project_name"))
        .unwrap_err();

    let PipelineError::Shape(ShapeError::Rejected { form, violations }) = &err else {
        panic!("expected a shape rejection, got {err:?}");
    };
    assert_eq!(*form, FormKind::UploadJob);
    assert!(violations.has_path("/project_name"));
    assert_eq!(violations.as_slice()[0].kind, ViolationKind::RequiredMissing);
}

#[test]
fn submit_job_lifts_both_levels() {
    let submission = pipeline().run(FormKind::SubmitJob, relaxed_submit_job()).unwrap();

    let jobs = submission.lifted.fields()["upload_jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    let modalities = jobs[0]["modalities"].as_array().unwrap();
    assert_eq!(modalities.len(), 1);
    assert_eq!(modalities[0], relaxed_modality());
    assert!(jobs[0].get("modality").is_none());

    let payload = &submission.validated.payload;
    assert_eq!(payload["upload_jobs"][0]["modalities"][0]["modality"], json!("ecephys"));
    assert_eq!(payload["job_type"], json!("transform_and_upload"));
}

#[test]
fn request_settings_reach_the_upload_job() {
    let submission = pipeline().run(FormKind::SubmitJob, relaxed_submit_job()).unwrap();
    let job = &submission.validated.payload["upload_jobs"][0];
    assert_eq!(job["user_email"], json!("someone@example.org"));
    assert_eq!(job["email_notification_types"], json!(["fail"]));
}

#[test]
fn notification_default_is_not_injected_into_the_form() {
    let submission = pipeline().run(FormKind::SubmitJob, relaxed_submit_job()).unwrap();
    assert!(!submission.form.fields().contains_key("email_notification_types"));
    assert_eq!(submission.validated.payload["email_notification_types"], json!(["fail"]));
}

#[test]
fn full_pipeline_is_idempotent() {
    let pipeline = pipeline();
    for (kind, raw) in [
        (FormKind::Modality, relaxed_modality()),
        (FormKind::UploadJob, relaxed_upload_job()),
        (FormKind::SubmitJob, relaxed_submit_job()),
    ] {
        let first = pipeline.run(kind, raw.clone()).unwrap();
        let second = pipeline.run(kind, raw).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn validated_payload_revalidates_unchanged() {
    let pipeline = pipeline();
    let submission = pipeline.run(FormKind::SubmitJob, relaxed_submit_job()).unwrap();
    let again = pipeline
        .validate_canonical(FormKind::SubmitJob, &submission.validated.payload)
        .unwrap();
    assert_eq!(again.payload, submission.validated.payload);
}

#[test]
fn canonical_rejection_carries_field_paths() {
    let err = pipeline()
        .run(FormKind::UploadJob, relaxed_upload_job_for("mouse 1"))
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(!err.is_shape_error());
    assert_eq!(err.violations()[0].path, "/subject_id");
}

#[test]
fn nested_canonical_rejection_points_into_sequences() {
    let mut raw = relaxed_submit_job();
    raw["upload_job"]["subject_id"] = json!("mouse_1");
    let err = pipeline().run(FormKind::SubmitJob, raw).unwrap_err();
    assert!(err
        .violations()
        .iter()
        .any(|v| v.path == "/upload_jobs/0/subject_id"));
}

#[test]
fn detailed_response_lists_violations() {
    let response = detailed_pipeline()
        .respond(FormKind::UploadJob, relaxed_upload_job_for("a:b"))
        .unwrap();
    assert!(!response.is_validated());
    assert_eq!(response.violations.len(), 1);

    let text = response.render_text(3).unwrap();
    assert!(text.contains("Validation failed:"));
    assert!(text.contains("/subject_id [invalid_value]"));
}

#[test]
fn accepted_response_echoes_both_blocks() {
    let response = pipeline()
        .respond(FormKind::Modality, relaxed_modality())
        .unwrap();
    assert_eq!(response.submitted, relaxed_modality());
    assert_eq!(response.validated.as_ref().unwrap()["output_folder_name"], json!("ecephys"));

    let serialized = serde_json::to_value(&response).unwrap();
    assert_eq!(serialized["form"], json!("modality"));
    assert!(serialized.get("violations").is_none());
}

#[test]
fn multi_selection_keeps_submission_order() {
    let mut raw = relaxed_submit_job();
    raw["email_notification_types"] = json!(["retry", "begin"]);
    let form = pipeline().parse(FormKind::SubmitJob, raw).unwrap();
    assert_eq!(form.fields()["email_notification_types"], json!(["retry", "begin"]));
}

#[test]
fn repeated_selection_collapses_into_the_set() {
    let mut raw = relaxed_upload_job();
    raw["email_notification_types"] = json!(["fail", "fail"]);

    let submission = pipeline().run(FormKind::UploadJob, raw).unwrap();
    assert_eq!(submission.form.fields()["email_notification_types"], json!(["fail", "fail"]));
    assert_eq!(submission.validated.payload["email_notification_types"], json!(["fail"]));
}

#[test]
fn null_multi_select_is_wrapped_then_rejected_by_form_schema() {
    let mut raw = relaxed_upload_job();
    raw["email_notification_types"] = json!(null);
    let err = pipeline().parse(FormKind::UploadJob, raw).unwrap_err();
    assert!(err
        .violations()
        .iter()
        .any(|v| v.path == "/email_notification_types/0"));
}

#[test]
fn malformed_json_is_a_shape_error() {
    let err = pipeline().run_str(FormKind::SubmitJob, "{\"upload_job\": ").unwrap_err();
    assert!(matches!(err, PipelineError::Shape(ShapeError::Syntax { .. })));
}
