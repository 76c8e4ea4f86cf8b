//! Transfer Forms
//!
//! Turns loosely-shaped form submissions into validated canonical records.
//! Form renderers cannot express repeated groups or reliable multi-selects,
//! so each form is a relaxed view of its canonical entity:
//!
//! ```text
//! raw JSON ──▶ normalize ──▶ relaxed schema ──▶ lift ──▶ canonical schema ──▶ models
//!              (multi-select    (shape errors)    (singular →   (field violations)
//!               → sequence)                        sequence)
//! ```
//!
//! # Core Concepts
//!
//! - [`FormKind`]: one form per canonical entity
//! - [`layout`]: flatten targets, multi-select and hidden fields
//! - [`relaxed_schema`]: the form schema, derived from the canonical schema
//! - [`RelaxedForm`]: a normalized submission the relaxed schema accepted
//! - [`lift`](lift::lift): relaxed → canonical shape, innermost first
//! - [`CanonicalValidator`]: canonical schema, deserialization, business rules
//! - [`FormPipeline`]: the three stages with logging and failure modes
//!
//! # Example
//!
//! ```rust,ignore
//! use transfer_forms::prelude::*;
//!
//! let pipeline = FormPipeline::new(PipelineConfig::default())?;
//! let submission = pipeline.run(FormKind::UploadJob, json!({
//!     "project_name": "Ephys Platform",
//!     "platform": "ECEPHYS",
//!     "modality": {"modality": "ECEPHYS", "source": "/data/x"},
//!     "subject_id": "123456",
//!     "acq_datetime": "2024-03-01 12:30:00",
//! }))?;
//! assert_eq!(submission.validated.payload["modalities"][0]["modality"], "ecephys");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
mod entity;
pub mod error;
pub mod layout;
pub mod lift;
mod normalize;
mod pipeline;
mod relaxed;
mod schema;
mod validator;

pub use config::{FailureMode, PipelineConfig};
pub use entity::{FormKind, UnknownForm};
pub use error::{ConfigError, LiftError, PipelineError, SchemaError, ShapeError};
pub use lift::LiftedForm;
pub use normalize::{coerce_to_sequence, normalize_multiplicity};
pub use pipeline::{to_pretty_json, FormPipeline, FormResponse, Submission};
pub use relaxed::RelaxedForm;
pub use schema::{canonical_schema, relaxed_schema, CompiledSchema, FormSchema, FormSchemas, SchemaTier};
pub use validator::{CanonicalRecord, CanonicalValidator, Validated};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running submissions
    pub use crate::{
        FailureMode, FormKind, FormPipeline, FormResponse, PipelineConfig, PipelineError, RelaxedForm,
        Submission,
    };
    pub use transfer_models::{FieldViolation, ValidationErrors, ViolationKind};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
