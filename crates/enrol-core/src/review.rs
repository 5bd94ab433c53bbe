//! # Review and Submission
//!
//! The final gate before the aggregate leaves the machine.
//!
//! - `validate_all` re-runs every section's required-field check.
//! - `summary` lays the aggregate out as labelled rows for the review screen.
//! - `SubmissionTracker` is the submit state machine. It refuses a second
//!   submission while one is outstanding, and a retry re-sends exactly the
//!   payload of the failed attempt.
//!
//! The network call itself lives in the app layer.

use crate::validation::{self, fields};
use crate::{EnrolError, FormData, Section};
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// FINAL VALIDATION
// =============================================================================

/// Outcome of the review gate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReviewReport {
    pub has_missing: bool,
    /// Only sections with at least one missing field appear.
    pub missing_by_section: BTreeMap<Section, Vec<String>>,
}

/// Required-field check of every section (no format checks).
#[must_use]
pub fn validate_all(form: &FormData) -> ReviewReport {
    let missing_by_section: BTreeMap<Section, Vec<String>> = Section::ALL
        .iter()
        .map(|&section| (section, validation::missing_fields(section, form.section(section))))
        .filter(|(_, missing)| !missing.is_empty())
        .collect();

    ReviewReport {
        has_missing: !missing_by_section.is_empty(),
        missing_by_section,
    }
}

/// One labelled value on the review screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: String,
}

/// Labelled rows per section, in form order. Blank optional fields are skipped.
#[must_use]
pub fn summary(form: &FormData) -> Vec<(Section, Vec<SummaryRow>)> {
    Section::ALL
        .iter()
        .map(|&section| {
            let record = form.section(section);
            let rows = fields(section)
                .iter()
                .filter_map(|spec| {
                    record.filled(spec.key).map(|value| SummaryRow {
                        label: spec.label,
                        value: value.to_string(),
                    })
                })
                .collect();
            (section, rows)
        })
        .collect()
}

// =============================================================================
// SUBMISSION STATE MACHINE
// =============================================================================

/// Where a submission stands. `A` is the backend acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState<A> {
    Idle,
    InFlight {
        payload: FormData,
    },
    Failed {
        payload: FormData,
        error: String,
    },
    Succeeded {
        ack: A,
    },
}

impl<A> Default for SubmissionState<A> {
    fn default() -> Self {
        Self::Idle
    }
}

/// What the applicant chose after a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSubmit {
    /// Back to the entry point, data kept.
    Continue,
    /// Clear the form store and blob store, then back to the entry point.
    Logout,
}

/// Drives `SubmissionState`; the caller performs the request in between.
#[derive(Debug, Clone)]
pub struct SubmissionTracker<A> {
    state: SubmissionState<A>,
}

impl<A> Default for SubmissionTracker<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> SubmissionTracker<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SubmissionState<A> {
        &self.state
    }

    /// True while a request is outstanding; the submit action is disabled.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, SubmissionState::InFlight { .. })
    }

    /// Start a submission of `form`. Returns the payload to send.
    pub fn begin(&mut self, form: &FormData) -> Result<FormData, EnrolError> {
        if self.is_in_flight() {
            return Err(EnrolError::SubmissionInFlight);
        }
        let payload = form.clone();
        self.state = SubmissionState::InFlight {
            payload: payload.clone(),
        };
        Ok(payload)
    }

    /// Re-send the payload of the failed attempt.
    pub fn retry(&mut self) -> Result<FormData, EnrolError> {
        match std::mem::take(&mut self.state) {
            SubmissionState::Failed { payload, .. } => {
                self.state = SubmissionState::InFlight {
                    payload: payload.clone(),
                };
                Ok(payload)
            }
            other => {
                let in_flight = matches!(other, SubmissionState::InFlight { .. });
                self.state = other;
                Err(if in_flight {
                    EnrolError::SubmissionInFlight
                } else {
                    EnrolError::NothingToRetry
                })
            }
        }
    }

    /// Record a failure. The payload is kept for retry.
    pub fn fail(&mut self, error: impl std::fmt::Display) {
        if let SubmissionState::InFlight { payload } = std::mem::take(&mut self.state) {
            self.state = SubmissionState::Failed {
                payload,
                error: error.to_string(),
            };
        }
    }

    /// Record success; any previous failure is cleared.
    pub fn succeed(&mut self, ack: A) {
        self.state = SubmissionState::Succeeded { ack };
    }

    /// Close the confirmation and go back to idle.
    pub fn acknowledge(&mut self, choice: AfterSubmit) -> AfterSubmit {
        self.state = SubmissionState::Idle;
        choice
    }
}

// =============================================================================
// TESTS
// =============================================================================
