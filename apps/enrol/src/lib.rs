//! # Enrol
//!
//! The front-end half of the admission wizard: everything that touches the
//! terminal, the network or an async runtime.
//!
//! - `config`: `enrol.toml` plus `ENROL_*` overrides
//! - `vault`: the document blob store, awaited off the runtime threads
//! - `client`: the admissions endpoint
//! - `submission`: submit, retry and the post-success choice
//! - `cli`: one command per wizard action

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod submission;
pub mod vault;

pub use client::{Ack, SubmitClient, SubmitError};
pub use config::Config;
pub use error::AppError;
pub use submission::Submitter;
pub use vault::DocumentVault;
