//! Canonical Transfer Models
//!
//! Authoritative shapes for data-transfer job submissions. These types are the
//! sole authority on acceptance: form tiers may collapse or hide fields, but
//! every submission ends up deserialized and finalized here.
//!
//! # Core Concepts
//!
//! - [`ModalityConfigs`]: one data collection modality and its source directory
//! - [`BasicUploadJobConfigs`]: one upload job, with one or more modalities
//! - [`SubmitJobRequest`]: a batch of upload jobs plus notification settings
//! - [`CanonicalModel`]: cross-field defaulting and business rules
//! - [`ValidationErrors`]: field-level violations with JSON-pointer paths
//!
//! # Example
//!
//! ```rust,ignore
//! use transfer_models::{CanonicalModel, ModalityConfigs};
//!
//! let configs: ModalityConfigs = serde_json::from_value(json!({
//!     "modality": "ECEPHYS",
//!     "source": "/data/x",
//! }))?;
//! let configs = configs.finalized()?;
//! assert_eq!(configs.compress_raw_data, Some(true));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod choices;
mod datetime;
mod model;
mod modality;
mod request;
mod upload_job;
mod violation;

pub use choices::{BucketType, Choice, ChoiceOption, EmailNotificationType, Modality, Platform, UnknownChoice};
pub use datetime::{AcqDateTime, DateTimeError};
pub use model::CanonicalModel;
pub use modality::ModalityConfigs;
pub use request::{SubmitJobRequest, DEFAULT_JOB_TYPE, MAX_UPLOAD_JOBS};
pub use upload_job::{BasicUploadJobConfigs, MAX_MODALITIES};
pub use violation::{join_path, FieldViolation, ValidationErrors, ViolationKind};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with canonical models
    pub use crate::{
        BasicUploadJobConfigs, CanonicalModel, Choice, FieldViolation, ModalityConfigs,
        SubmitJobRequest, ValidationErrors, ViolationKind,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
