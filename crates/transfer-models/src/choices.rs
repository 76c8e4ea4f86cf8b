//! Enumerated Choices
//!
//! Statically declared option tables for modalities, platforms, buckets and
//! notification types. Form dropdowns are generated from these same tables,
//! so the form tier can never offer a value the canonical models reject.

use std::fmt;

use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A closed set of labeled options
///
/// `abbreviation` is the canonical wire value; `key` is the upper-case
/// option identifier shown to form renderers (`behavior-videos` becomes
/// `BEHAVIOR_VIDEOS`). Parsing accepts either, case-insensitively.
pub trait Choice: Copy + PartialEq + fmt::Debug + 'static {
    /// Human-readable name of the option set
    const KIND: &'static str;

    /// Every option, in declaration order
    const ALL: &'static [Self];

    /// Canonical wire value
    fn abbreviation(self) -> &'static str;

    /// Display label
    fn label(self) -> &'static str;

    /// Upper-case option key
    #[must_use]
    fn key(self) -> String {
        option_key(self.abbreviation())
    }

    /// Value a form renderer submits for this option
    #[must_use]
    fn option_value(self) -> String {
        self.key()
    }

    /// Resolve an option from its key or abbreviation
    #[must_use]
    fn parse_choice(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::ALL.iter().copied().find(|choice| {
            choice.abbreviation().eq_ignore_ascii_case(input) || choice.key().eq_ignore_ascii_case(input)
        })
    }

    /// Dropdown options for form renderers
    #[must_use]
    fn options() -> Vec<ChoiceOption> {
        Self::ALL
            .iter()
            .map(|choice| ChoiceOption {
                value: choice.option_value(),
                label: choice.label().to_owned(),
            })
            .collect()
    }
}

/// One dropdown entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Value the renderer submits
    pub value: String,
    /// Text shown in the dropdown
    pub label: String,
}

/// Unknown option value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}', expected one of: {expected}")]
pub struct UnknownChoice {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

impl UnknownChoice {
    fn new<C: Choice>(value: &str) -> Self {
        let expected = C::ALL
            .iter()
            .map(|choice| choice.abbreviation())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            kind: C::KIND,
            value: value.to_owned(),
            expected,
        }
    }
}

/// Derive an option key from an abbreviation
#[must_use]
pub(crate) fn option_key(abbreviation: &str) -> String {
    abbreviation.to_uppercase().replace('-', "_")
}

/// String schema enumerating keys and abbreviations
fn choice_schema<C: Choice>() -> Schema {
    let mut values: Vec<Value> = Vec::with_capacity(C::ALL.len() * 2);
    for choice in C::ALL {
        for candidate in [choice.key(), choice.abbreviation().to_owned()] {
            let candidate = Value::String(candidate);
            if !values.contains(&candidate) {
                values.push(candidate);
            }
        }
    }

    SchemaObject {
        instance_type: Some(InstanceType::String.into()),
        enum_values: Some(values),
        ..Default::default()
    }
    .into()
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => ($abbr:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl Choice for $name {
            const KIND: &'static str = $kind;
            const ALL: &'static [Self] = &[$( $name::$variant ),+];

            fn abbreviation(self) -> &'static str {
                match self {
                    $( $name::$variant => $abbr ),+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownChoice;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$name as Choice>::parse_choice(s).ok_or_else(|| UnknownChoice::new::<$name>(s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.abbreviation())
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.abbreviation())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }

        impl JsonSchema for $name {
            fn schema_name() -> String {
                stringify!($name).to_owned()
            }

            fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
                choice_schema::<$name>()
            }
        }
    };
}

choice_enum! {
    /// Data collection modality
    Modality, "modality" {
        Behavior => ("behavior", "Behavior"),
        BehaviorVideos => ("behavior-videos", "Behavior videos"),
        Confocal => ("confocal", "Confocal microscopy"),
        Emg => ("EMG", "Electromyography"),
        Ecephys => ("ecephys", "Extracellular electrophysiology"),
        Fib => ("fib", "Fiber photometry"),
        Fmost => ("fMOST", "Fluorescence micro-optical sectioning tomography"),
        Icephys => ("icephys", "Intracellular electrophysiology"),
        Isi => ("ISI", "Intrinsic signal imaging"),
        Merfish => ("merfish", "Multiplexed error-robust fluorescence in situ hybridization"),
        Mri => ("MRI", "Magnetic resonance imaging"),
        Pophys => ("ophys", "Planar optical physiology"),
        Slap => ("slap", "Scanned line projection imaging"),
        Spim => ("SPIM", "Selective plane illumination microscopy"),
    }
}

impl Modality {
    /// Whether raw data is compressed when the submission leaves it unset
    #[inline]
    #[must_use]
    pub fn compresses_by_default(self) -> bool {
        matches!(self, Self::Ecephys | Self::BehaviorVideos)
    }
}

choice_enum! {
    /// Acquisition platform
    Platform, "platform" {
        Behavior => ("behavior", "Behavior platform"),
        Confocal => ("confocal", "Confocal microscopy platform"),
        Dispim => ("diSPIM", "Dual inverted selective plane illumination microscopy platform"),
        Ecephys => ("ecephys", "Electrophysiology platform"),
        Exaspim => ("exaSPIM", "ExaSPIM platform"),
        Fip => ("FIP", "Frame-projected independent-fiber photometry platform"),
        Hcr => ("HCR", "Hybridization chain reaction platform"),
        Hsfp => ("HSFP", "Hyperspectral fiber photometry platform"),
        Isi => ("ISI", "Intrinsic signal imaging platform"),
        Mesospim => ("mesoSPIM", "MesoSPIM platform"),
        Merfish => ("MERFISH", "MERFISH platform"),
        Mri => ("MRI", "Magnetic resonance imaging platform"),
        MultiplaneOphys => ("multiplane-ophys", "Multiplane optical physiology platform"),
        SingleplaneOphys => ("single-plane-ophys", "Single-plane optical physiology platform"),
        Slap2 => ("SLAP2", "SLAP2 platform"),
        Smartspim => ("SmartSPIM", "SmartSPIM platform"),
    }
}

/// Upload destination bucket
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum BucketType {
    #[default]
    Private,
    Open,
    Scratch,
}

impl Choice for BucketType {
    const KIND: &'static str = "bucket";
    const ALL: &'static [Self] = &[Self::Private, Self::Open, Self::Scratch];

    fn abbreviation(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Open => "open",
            Self::Scratch => "scratch",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Private => "Private",
            Self::Open => "Open",
            Self::Scratch => "Scratch (to be deprecated)",
        }
    }

    fn option_value(self) -> String {
        self.abbreviation().to_owned()
    }
}

/// Job status that triggers an email notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EmailNotificationType {
    Begin,
    End,
    Fail,
    Retry,
    All,
}

impl Choice for EmailNotificationType {
    const KIND: &'static str = "email notification type";
    const ALL: &'static [Self] = &[Self::Begin, Self::End, Self::Fail, Self::Retry, Self::All];

    fn abbreviation(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::End => "end",
            Self::Fail => "fail",
            Self::Retry => "retry",
            Self::All => "all",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Begin => "Job started",
            Self::End => "Job finished",
            Self::Fail => "Job failed",
            Self::Retry => "Job retried",
            Self::All => "All statuses",
        }
    }

    fn option_value(self) -> String {
        self.abbreviation().to_owned()
    }
}
