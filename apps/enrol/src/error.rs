//! Errors surfaced by the front-end.

use crate::client::SubmitError;
use enrol_core::{EnrolError, Section};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] EnrolError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(String),

    /// A blocking storage task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),

    #[error("The {0} section was not saved, fix the fields above")]
    SectionRejected(Section),

    #[error("The application is incomplete, {0} section(s) have missing fields")]
    Incomplete(usize),
}
