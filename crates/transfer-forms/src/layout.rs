//! Form layout
//!
//! Declares how each form departs from its canonical entity. The relaxed
//! schema, the multiplicity normalizer and the lifter all read this one
//! table, so adding a collapsed relationship is a one-line change.

use crate::entity::FormKind;

/// A sequence field collapsed to a single value in the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenTarget {
    /// Form that owns the field
    pub owner: FormKind,
    /// Singular key the form submits
    pub relaxed_key: &'static str,
    /// Sequence key the canonical entity expects
    pub canonical_key: &'static str,
    /// Form describing the element
    pub element: FormKind,
}

/// A logically multi-valued field the renderer may submit as a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiSelectField {
    /// Form that owns the field
    pub owner: FormKind,
    /// Field key, the same in both tiers
    pub key: &'static str,
}

/// A canonical field the form does not offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiddenField {
    /// Form that hides the field
    pub owner: FormKind,
    /// Canonical key left out of the form schema
    pub key: &'static str,
}

const FLATTEN_TARGETS: &[FlattenTarget] = &[
    FlattenTarget {
        owner: FormKind::UploadJob,
        relaxed_key: "modality",
        canonical_key: "modalities",
        element: FormKind::Modality,
    },
    FlattenTarget {
        owner: FormKind::SubmitJob,
        relaxed_key: "upload_job",
        canonical_key: "upload_jobs",
        element: FormKind::UploadJob,
    },
];

const MULTI_SELECT_FIELDS: &[MultiSelectField] = &[
    MultiSelectField {
        owner: FormKind::UploadJob,
        key: "email_notification_types",
    },
    MultiSelectField {
        owner: FormKind::SubmitJob,
        key: "email_notification_types",
    },
];

const HIDDEN_FIELDS: &[HiddenField] = &[HiddenField {
    owner: FormKind::Modality,
    key: "job_settings",
}];

/// Collapsed relationships of a form
pub fn flatten_targets(kind: FormKind) -> impl Iterator<Item = &'static FlattenTarget> {
    FLATTEN_TARGETS.iter().filter(move |target| target.owner == kind)
}

/// Multi-select fields of a form
pub fn multi_select_fields(kind: FormKind) -> impl Iterator<Item = &'static str> {
    MULTI_SELECT_FIELDS
        .iter()
        .filter(move |field| field.owner == kind)
        .map(|field| field.key)
}

/// Canonical fields a form hides
pub fn hidden_fields(kind: FormKind) -> impl Iterator<Item = &'static str> {
    HIDDEN_FIELDS
        .iter()
        .filter(move |field| field.owner == kind)
        .map(|field| field.key)
}
