//! # Core Type Definitions
//!
//! This module contains all core types for the Enrol wizard:
//! - Wizard positions (`Section`, `Step`)
//! - Form state (`SectionRecord`, `FormData`)
//! - Closed choice lists (`Gender`, `Relationship`, `ClassLevel`, `BloodGroup`, `Genotype`)
//! - Error types (`EnrolError`)
//!
//! ## Ordering Guarantees
//!
//! Records use `BTreeMap` so that the serialized aggregate is byte-stable
//! for identical input, which keeps retries and reloads comparable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// WIZARD POSITIONS
// =============================================================================

/// A data-bearing step of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Personal,
    Guardian,
    Academic,
    Health,
    Documents,
}

impl Section {
    /// All sections in wizard order.
    pub const ALL: [Section; 5] = [
        Section::Personal,
        Section::Guardian,
        Section::Academic,
        Section::Health,
        Section::Documents,
    ];

    /// Machine name, also the JSON key in the aggregate.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Guardian => "guardian",
            Self::Academic => "academic",
            Self::Health => "health",
            Self::Documents => "documents",
        }
    }

    /// Menu title of the section.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Personal => "Personal Info",
            Self::Guardian => "Guardian Info",
            Self::Academic => "Academic History",
            Self::Health => "Health Info",
            Self::Documents => "Upload Document",
        }
    }

    /// The wizard step showing this section.
    #[must_use]
    pub const fn step(self) -> Step {
        match self {
            Self::Personal => Step::Personal,
            Self::Guardian => Step::Guardian,
            Self::Academic => Step::Academic,
            Self::Health => Step::Health,
            Self::Documents => Step::Documents,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = EnrolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EnrolError::UnknownStep(s.to_string()))
    }
}

/// A position of the wizard: every section plus the final review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Personal,
    Guardian,
    Academic,
    Health,
    Documents,
    Review,
}

impl Step {
    /// All steps in wizard order.
    pub const ALL: [Step; 6] = [
        Step::Personal,
        Step::Guardian,
        Step::Academic,
        Step::Health,
        Step::Documents,
        Step::Review,
    ];

    /// Zero-based position in the wizard.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The section edited on this step, `None` for review.
    #[must_use]
    pub const fn section(self) -> Option<Section> {
        match self {
            Self::Personal => Some(Section::Personal),
            Self::Guardian => Some(Section::Guardian),
            Self::Academic => Some(Section::Academic),
            Self::Health => Some(Section::Health),
            Self::Documents => Some(Section::Documents),
            Self::Review => None,
        }
    }

    /// The step following this one, `None` after review.
    #[must_use]
    pub fn next(self) -> Option<Step> {
        Step::ALL.get(self.index() + 1).copied()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self.section() {
            Some(section) => section.as_str(),
            None => "review",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self.section() {
            Some(section) => section.title(),
            None => "Review",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = EnrolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Step::ALL
            .into_iter()
            .find(|step| step.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EnrolError::UnknownStep(s.to_string()))
    }
}

impl From<Section> for Step {
    fn from(section: Section) -> Self {
        section.step()
    }
}

// =============================================================================
// FORM STATE
// =============================================================================

/// The field values of one section, keyed by camelCase field name.
///
/// Records are schema-less: unknown fields are kept and round-tripped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionRecord(BTreeMap<String, String>);

impl SectionRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field value, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Get a trimmed field value, treating blank values as absent.
    #[must_use]
    pub fn filled(&self, field: &str) -> Option<&str> {
        self.get(field).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Set a field value, returning the previous one.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(field.into(), value.into())
    }

    /// Remove a field.
    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.0.remove(field)
    }

    /// Shallow merge: every field of `patch` overwrites the field here.
    pub fn merge(&mut self, patch: &SectionRecord) {
        for (field, value) in &patch.0 {
            self.0.insert(field.clone(), value.clone());
        }
    }

    /// Builder-style insert, handy for literals.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SectionRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// The aggregate of every section: the unit persisted and the unit submitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormData {
    #[serde(default)]
    pub personal: SectionRecord,
    #[serde(default)]
    pub guardian: SectionRecord,
    #[serde(default)]
    pub academic: SectionRecord,
    #[serde(default)]
    pub health: SectionRecord,
    #[serde(default)]
    pub documents: SectionRecord,
}

impl FormData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn section(&self, section: Section) -> &SectionRecord {
        match section {
            Section::Personal => &self.personal,
            Section::Guardian => &self.guardian,
            Section::Academic => &self.academic,
            Section::Health => &self.health,
            Section::Documents => &self.documents,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut SectionRecord {
        match section {
            Section::Personal => &mut self.personal,
            Section::Guardian => &mut self.guardian,
            Section::Academic => &mut self.academic,
            Section::Health => &mut self.health,
            Section::Documents => &mut self.documents,
        }
    }

    /// True when no section holds any field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Section::ALL.iter().all(|s| self.section(*s).is_empty())
    }

    /// Full name of the applicant for headers, "User" when unknown.
    #[must_use]
    pub fn applicant_name(&self) -> String {
        match (
            self.personal.filled("firstName"),
            self.personal.filled("lastName"),
        ) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            _ => "User".to_string(),
        }
    }

    /// Upper-case initials of the applicant.
    #[must_use]
    pub fn applicant_initials(&self) -> String {
        let first = self.personal.filled("firstName").unwrap_or("User");
        let last = self.personal.filled("lastName").unwrap_or("");
        first
            .chars()
            .take(1)
            .chain(last.chars().take(1))
            .flat_map(char::to_uppercase)
            .collect()
    }
}

// =============================================================================
// CHOICE LISTS
// =============================================================================

/// Declares a closed list of values accepted by a select field.
macro_rules! choice_list {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every accepted value, in display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = EnrolError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|choice| choice.as_str() == s)
                    .ok_or_else(|| EnrolError::InvalidChoice {
                        list: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }
    };
}

choice_list!(
    /// Applicant gender.
    Gender { Male => "Male", Female => "Female" }
);

choice_list!(
    /// How the guardian relates to the applicant.
    Relationship {
        Father => "Father",
        Mother => "Mother",
        Guardian => "Guardian",
        Other => "Other",
    }
);

choice_list!(
    /// Last class completed at the previous school.
    ClassLevel {
        Jhs3 => "JHS-3",
        Jhs2 => "JHS-2",
        Jhs1 => "JHS-1",
        UpperPrimary6 => "Upper-Primary-6",
        UpperPrimary5 => "Upper-Primary-5",
        UpperPrimary4 => "Upper-Primary-4",
        LowerPrimary3 => "Lower-Primary-3",
        LowerPrimary2 => "Lower-Primary-2",
        LowerPrimary1 => "Lower-Primary-1",
    }
);

choice_list!(
    BloodGroup {
        APositive => "A+",
        ANegative => "A-",
        BPositive => "B+",
        BNegative => "B-",
        AbPositive => "AB+",
        AbNegative => "AB-",
        OPositive => "O+",
        ONegative => "O-",
    }
);

choice_list!(
    Genotype {
        Aa => "AA",
        Ao => "AO",
        Bb => "BB",
        Bo => "BO",
        Ab => "AB",
        Oo => "OO",
        As => "AS",
        Ss => "SS",
        RhPositive => "RR",
        RhHeterozygous => "Rr",
        RhNegative => "rr",
    }
);

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Enrol core.
///
/// Field validation problems are NOT errors: they are reported as values by
/// the validators. This enum covers storage, encoding and state-machine misuse.
#[derive(Debug, Error)]
pub enum EnrolError {
    /// A step or section name was not recognised.
    #[error("Unknown step: {0}")]
    UnknownStep(String),

    /// A select value is not in its closed list.
    #[error("'{value}' is not a valid {list}")]
    InvalidChoice { list: &'static str, value: String },

    /// A value is too large for the small form store.
    #[error("Value of {section}.{field} is {len} bytes, limit is {max}")]
    ValueTooLarge {
        section: Section,
        field: String,
        len: usize,
        max: usize,
    },

    /// Navigation to a step whose predecessors are incomplete.
    #[error("Step '{0}' is locked until earlier steps are complete")]
    StepLocked(Step),

    /// A document exceeds its slot's size limit.
    #[error("{slot} is {size} bytes, limit is {max} bytes")]
    FileTooLarge { slot: String, size: u64, max: u64 },

    /// A document's type is not accepted by its slot.
    #[error("{slot} does not accept files of type {content_type}")]
    UnsupportedFileType { slot: String, content_type: String },

    /// A preview data URI is malformed.
    #[error("Invalid preview: {0}")]
    InvalidPreview(String),

    /// A submission is already outstanding.
    #[error("A submission is already in progress")]
    SubmissionInFlight,

    /// Retry was requested with no failed submission to retry.
    #[error("No failed submission to retry")]
    NothingToRetry,

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O or storage engine error occurred.
    #[error("Storage error: {0}")]
    StorageError(String),
}

// =============================================================================
// TESTS
// =============================================================================
