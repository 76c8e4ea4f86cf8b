//! Pipeline configuration
//!
//! Layered: defaults, then a YAML or JSON file, then `TRANSFER_FORMS_*`
//! environment variables. The CLI applies its flags last.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Failure mode override
pub const ENV_FAILURE_MODE: &str = "TRANSFER_FORMS_FAILURE_MODE";
/// Output indent override
pub const ENV_INDENT: &str = "TRANSFER_FORMS_INDENT";
/// Log filter override
pub const ENV_LOG: &str = "TRANSFER_FORMS_LOG";

/// Widest accepted JSON indent
pub const MAX_OUTPUT_INDENT: usize = 16;

/// Parse an indent width, rejecting anything above [`MAX_OUTPUT_INDENT`]
///
/// # Errors
/// Returns a message naming the accepted range
pub fn parse_indent(text: &str) -> Result<usize, String> {
    let indent: usize = text.trim().parse().map_err(|err: std::num::ParseIntError| err.to_string())?;
    check_indent(indent)
}

fn check_indent(indent: usize) -> Result<usize, String> {
    if indent > MAX_OUTPUT_INDENT {
        Err(format!("indent {indent} is wider than {MAX_OUTPUT_INDENT}"))
    } else {
        Ok(indent)
    }
}

/// What the boundary echoes when canonical validation rejects a submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Log the rejection, echo the form without a validated block
    #[default]
    Omit,
    /// Echo the field violations as well
    Detailed,
}

impl FailureMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Omit => "omit",
            Self::Detailed => "detailed",
        }
    }
}

impl fmt::Display for FailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "omit" => Ok(Self::Omit),
            "detailed" => Ok(Self::Detailed),
            other => Err(format!("unknown failure mode '{other}', expected omit or detailed")),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Boundary behavior on canonical rejection
    pub failure_mode: FailureMode,
    /// Indent width of echoed JSON
    pub output_indent: usize,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            failure_mode: FailureMode::Omit,
            output_indent: 3,
            log_level: "info".to_owned(),
        }
    }
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With failure mode
    #[inline]
    #[must_use]
    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// With output indent, clamped to [`MAX_OUTPUT_INDENT`]
    #[inline]
    #[must_use]
    pub fn with_output_indent(mut self, indent: usize) -> Self {
        self.output_indent = indent.min(MAX_OUTPUT_INDENT);
        self
    }

    /// With log level
    #[inline]
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Parse YAML configuration
    ///
    /// # Errors
    /// Returns [`ConfigError::Yaml`] on malformed input or unknown keys
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str::<Self>(text)?.checked()
    }

    /// Parse JSON configuration
    ///
    /// # Errors
    /// Returns [`ConfigError::Json`] on malformed input or unknown keys
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(text)?.checked()
    }

    fn checked(self) -> Result<Self, ConfigError> {
        check_indent(self.output_indent).map_err(|reason| ConfigError::Invalid {
            key: "output_indent",
            reason,
        })?;
        Ok(self)
    }

    /// Load a config file; `.json` is read as JSON, anything else as YAML
    ///
    /// # Errors
    /// Returns IO or parse errors
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::io_error(path, err))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&text)
        } else {
            Self::from_yaml(&text)
        }
    }

    /// Apply `TRANSFER_FORMS_*` overrides from a lookup
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidEnv`] for unparseable values
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = non_empty(lookup(ENV_FAILURE_MODE)) {
            self.failure_mode = value.parse().map_err(|reason| ConfigError::InvalidEnv {
                var: ENV_FAILURE_MODE,
                value: value.clone(),
                reason,
            })?;
        }
        if let Some(value) = non_empty(lookup(ENV_INDENT)) {
            self.output_indent = parse_indent(&value).map_err(|reason| ConfigError::InvalidEnv {
                var: ENV_INDENT,
                value: value.clone(),
                reason,
            })?;
        }
        if let Some(value) = non_empty(lookup(ENV_LOG)) {
            self.log_level = value;
        }
        Ok(self)
    }

    /// Apply overrides from the process environment
    ///
    /// # Errors
    /// As [`PipelineConfig::with_env_overrides`]
    pub fn with_process_env(self) -> Result<Self, ConfigError> {
        self.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key/value map
    ///
    /// # Errors
    /// As [`PipelineConfig::with_env_overrides`]
    pub fn with_env_map(self, vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        self.with_env_overrides(|key| vars.get(key).cloned())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
