//! # Section Validators
//!
//! One rule set per wizard section. Every rule set reports:
//! - `missing_fields`: human labels of required fields left blank
//! - `errors`: format and cross-field problems on filled fields
//!
//! Validators are pure functions of a `SectionRecord`; they never mutate it.
//! A section is complete iff its report is empty.
//!
//! ## Input masking
//!
//! Phone fields are masked as they are entered (`normalize_input`): non-digit
//! characters are dropped and the value is cut at ten digits. Masking is an
//! input policy and is not repeated by the validators.

use crate::primitives::PHONE_DIGITS;
use crate::{BloodGroup, ClassLevel, Gender, Genotype, Relationship, Section, SectionRecord};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

/// `local@domain.tld`, no whitespace, a single `@`.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Constant pattern, compiled by the `email_pattern` test.
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Wire format of every date field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// FIELD TABLES
// =============================================================================

/// A field of a section form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// camelCase key in the section record.
    pub key: &'static str,
    /// Label shown to the applicant and reported when missing.
    pub label: &'static str,
    pub required: bool,
}

const fn required(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        required: true,
    }
}

const fn optional(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        required: false,
    }
}

const PERSONAL_FIELDS: &[FieldSpec] = &[
    required("firstName", "First Name"),
    required("lastName", "Last Name"),
    optional("middleName", "Middle Name"),
    required("gender", "Gender"),
    required("dateOfBirth", "Date of Birth"),
    required("nationality", "Nationality"),
    required("address", "Address"),
    required("phoneNumber", "Phone Number"),
    required("email", "Email"),
];

const GUARDIAN_FIELDS: &[FieldSpec] = &[
    required("fullName", "Full Name"),
    required("relationship", "Relationship"),
    required("occupation", "Occupation"),
    required("nationality", "Nationality"),
    required("phoneNumber", "Phone Number"),
    required("emergencyNumber", "Emergency Number"),
    optional("email", "Email"),
    required("address", "Address"),
];

const ACADEMIC_FIELDS: &[FieldSpec] = &[
    required("schoolName", "Last School Attended"),
    required("schoolAddress", "School Address"),
    required("startDate", "From"),
    required("endDate", "To"),
    required("classCompleted", "Class Completed"),
    optional("reasonForLeaving", "Reason for Leaving"),
];

// Allergies and medical conditions are optional free text.
const HEALTH_FIELDS: &[FieldSpec] = &[
    required("bloodGroup", "Blood Group"),
    required("genotype", "Genotype"),
    optional("allergies", "Allergies"),
    optional("medicalCondition", "Existing Medical Conditions"),
    optional("doctorContact", "Doctor's Contact"),
];

const DOCUMENT_FIELDS: &[FieldSpec] = &[
    required("passportPhoto", "Passport Photograph"),
    required("birthCertificate", "Birth Certificate"),
    required("terminalResult", "Terminal Result / Testimonial"),
    optional("medicalReport", "Medical Report"),
];

/// The fields of a section, in form order.
#[must_use]
pub fn fields(section: Section) -> &'static [FieldSpec] {
    match section {
        Section::Personal => PERSONAL_FIELDS,
        Section::Guardian => GUARDIAN_FIELDS,
        Section::Academic => ACADEMIC_FIELDS,
        Section::Health => HEALTH_FIELDS,
        Section::Documents => DOCUMENT_FIELDS,
    }
}

/// Look up a field of a section by key.
#[must_use]
pub fn field(section: Section, key: &str) -> Option<&'static FieldSpec> {
    fields(section).iter().find(|spec| spec.key == key)
}

// =============================================================================
// REPORT
// =============================================================================

/// A format or cross-field problem on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Outcome of validating one section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Labels of required fields left blank, in form order.
    pub missing_fields: Vec<String>,
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    /// Zero missing fields and zero errors.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields.is_empty() && self.errors.is_empty()
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Validate a section against today's date.
#[must_use]
pub fn validate(section: Section, record: &SectionRecord) -> ValidationReport {
    validate_on(section, record, chrono::Local::now().date_naive())
}

/// Validate a section, with `today` bounding the date of birth.
#[must_use]
pub fn validate_on(section: Section, record: &SectionRecord, today: NaiveDate) -> ValidationReport {
    let missing_fields = missing_fields(section, record);
    let mut errors = Vec::new();

    match section {
        Section::Personal => {
            check_choice::<Gender>(record, "gender", &mut errors);
            if let Some(dob) = check_date(record, "dateOfBirth", &mut errors)
                && dob > today
            {
                errors.push(FieldError::new(
                    "dateOfBirth",
                    "Date of birth cannot be in the future",
                ));
            }
            check_phone(record, "phoneNumber", &mut errors);
            check_email(record, "email", &mut errors);
        }
        Section::Guardian => {
            check_choice::<Relationship>(record, "relationship", &mut errors);
            check_phone(record, "phoneNumber", &mut errors);
            check_phone(record, "emergencyNumber", &mut errors);
            check_email(record, "email", &mut errors);
            if let (Some(phone), Some(emergency)) = (
                record.filled("phoneNumber"),
                record.filled("emergencyNumber"),
            ) && phone == emergency
            {
                errors.push(FieldError::new(
                    "emergencyNumber",
                    "Emergency number must differ from the phone number",
                ));
            }
        }
        Section::Academic => {
            check_choice::<ClassLevel>(record, "classCompleted", &mut errors);
            let start = check_date(record, "startDate", &mut errors);
            let end = check_date(record, "endDate", &mut errors);
            if let (Some(start), Some(end)) = (start, end)
                && start >= end
            {
                errors.push(FieldError::new(
                    "endDate",
                    "'From' date must be earlier than 'To' date",
                ));
            }
        }
        Section::Health => {
            check_choice::<BloodGroup>(record, "bloodGroup", &mut errors);
            check_choice::<Genotype>(record, "genotype", &mut errors);
            if let Some(contact) = record.filled("doctorContact")
                && (!contact.bytes().all(|b| b.is_ascii_digit()) || contact.len() > PHONE_DIGITS)
            {
                errors.push(FieldError::new(
                    "doctorContact",
                    format!("Doctor's contact must be at most {PHONE_DIGITS} digits"),
                ));
            }
        }
        // File names only; upload rules are enforced when a file is attached.
        Section::Documents => {}
    }

    ValidationReport {
        missing_fields,
        errors,
    }
}

/// Required-field check only: labels of required fields that are blank.
#[must_use]
pub fn missing_fields(section: Section, record: &SectionRecord) -> Vec<String> {
    fields(section)
        .iter()
        .filter(|spec| spec.required && record.filled(spec.key).is_none())
        .map(|spec| spec.label.to_string())
        .collect()
}

/// True iff the section passes its full validator.
#[must_use]
pub fn is_complete(section: Section, record: &SectionRecord) -> bool {
    validate(section, record).is_complete()
}

fn check_choice<T: FromStr>(record: &SectionRecord, key: &str, errors: &mut Vec<FieldError>) {
    if let Some(value) = record.filled(key)
        && value.parse::<T>().is_err()
    {
        errors.push(FieldError::new(key, format!("'{value}' is not a valid option")));
    }
}

fn check_date(
    record: &SectionRecord,
    key: &str,
    errors: &mut Vec<FieldError>,
) -> Option<NaiveDate> {
    let value = record.filled(key)?;
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(FieldError::new(key, "Please enter a valid date (YYYY-MM-DD)"));
            None
        }
    }
}

fn check_phone(record: &SectionRecord, key: &str, errors: &mut Vec<FieldError>) {
    if let Some(value) = record.filled(key)
        && !is_valid_phone(value)
    {
        errors.push(FieldError::new(
            key,
            format!("Phone number must be exactly {PHONE_DIGITS} digits"),
        ));
    }
}

fn check_email(record: &SectionRecord, key: &str, errors: &mut Vec<FieldError>) {
    if let Some(value) = record.filled(key)
        && !is_valid_email(value)
    {
        errors.push(FieldError::new(key, "Please enter a valid email address"));
    }
}

/// `local@domain.tld` check.
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Exactly ten ASCII digits.
#[must_use]
pub fn is_valid_phone(value: &str) -> bool {
    value.len() == PHONE_DIGITS && value.bytes().all(|b| b.is_ascii_digit())
}

// =============================================================================
// INPUT MASKING
// =============================================================================

/// Drop every non-digit character and keep at most ten digits.
#[must_use]
pub fn mask_phone_input(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_digit)
        .take(PHONE_DIGITS)
        .collect()
}

/// True for fields whose input is phone-masked.
#[must_use]
pub fn is_phone_field(section: Section, key: &str) -> bool {
    matches!(
        (section, key),
        (Section::Personal, "phoneNumber")
            | (Section::Guardian, "phoneNumber" | "emergencyNumber")
            | (Section::Health, "doctorContact")
    )
}

/// Apply the input policy of a field to a raw entry.
#[must_use]
pub fn normalize_input(section: Section, key: &str, raw: &str) -> String {
    if is_phone_field(section, key) {
        mask_phone_input(raw)
    } else {
        raw.to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================
