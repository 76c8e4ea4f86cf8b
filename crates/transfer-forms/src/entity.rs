//! Form kinds
//!
//! One form per canonical entity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Entity a submitted form describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormKind {
    /// `ModalityConfigs`
    Modality,
    /// `BasicUploadJobConfigs`
    UploadJob,
    /// `SubmitJobRequest`
    SubmitJob,
}

impl FormKind {
    pub const ALL: [FormKind; 3] = [Self::Modality, Self::UploadJob, Self::SubmitJob];

    /// CLI and config name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Modality => "modality",
            Self::UploadJob => "upload-job",
            Self::SubmitJob => "submit-job",
        }
    }

    /// Name of the canonical type, as it appears in schema definitions
    #[must_use]
    pub fn schema_name(self) -> &'static str {
        match self {
            Self::Modality => "ModalityConfigs",
            Self::UploadJob => "BasicUploadJobConfigs",
            Self::SubmitJob => "SubmitJobRequest",
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown form name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown form '{0}', expected one of: modality, upload-job, submit-job")]
pub struct UnknownForm(pub String);

impl FromStr for FormKind {
    type Err = UnknownForm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "modality" | "modality-configs" | "modalityconfigs" => Ok(Self::Modality),
            "upload-job" | "basic-upload-job-configs" | "basicuploadjobconfigs" => Ok(Self::UploadJob),
            "submit-job" | "submit-job-request" | "submitjobrequest" => Ok(Self::SubmitJob),
            _ => Err(UnknownForm(s.to_owned())),
        }
    }
}
