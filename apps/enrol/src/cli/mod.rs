//! # Enrol CLI Module
//!
//! One command per wizard action. Every invocation reopens the saved form,
//! so a multi-day application is just a series of commands.
//!
//! ## Available Commands
//!
//! - `status` - Show progress through the steps
//! - `fill` - Save fields of a section and advance
//! - `edit` - Jump back to a section from review
//! - `goto` - Navigate directly to a reachable step
//! - `attach` - Upload a document into a slot
//! - `preview` - Show or export an uploaded document
//! - `review` - Summarize the application and list missing fields
//! - `submit` - Send the application to the admissions office
//! - `logout` - Erase all saved data

mod commands;

use crate::{AppError, Config};
use clap::{Parser, Subcommand, ValueEnum};
use enrol_core::{AfterSubmit, DocumentSlot, Section, Step};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Enrol - school admission intake
///
/// Walks an applicant through personal, guardian, academic, health and
/// document details, then submits the application.
#[derive(Parser, Debug)]
#[command(name = "enrol")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./enrol.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory, overrides the configuration
    #[arg(short = 'D', long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show progress through the wizard
    Status,

    /// Save fields of a section (key=value pairs) and advance
    Fill {
        /// Section to fill; `documents` takes no fields and completes the upload step
        section: Section,

        /// Field assignments, e.g. firstName=Ama
        #[arg(value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },

    /// Edit a section from the review step
    Edit { section: Section },

    /// Go directly to a step
    Goto { step: Step },

    /// Upload a document
    Attach {
        /// Slot (passportPhoto, birthCertificate, terminalResult, medicalReport)
        slot: DocumentSlot,

        /// File to upload
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show an uploaded document's preview
    Preview {
        slot: DocumentSlot,

        /// Write the decoded file here instead of printing a description
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize the application and list missing fields
    Review,

    /// Submit the application
    Submit {
        /// Retry a failed submission this many times
        #[arg(short, long, default_value = "0")]
        retries: u32,

        /// What to do after a successful submission
        #[arg(short, long, value_enum, default_value = "continue")]
        then: AfterChoice,
    },

    /// Erase the saved form and documents
    Logout,
}

/// Post-submission choice on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AfterChoice {
    /// Keep the saved data
    Continue,
    /// Erase the saved data
    Logout,
}

impl From<AfterChoice> for AfterSubmit {
    fn from(choice: AfterChoice) -> Self {
        match choice {
            AfterChoice::Continue => AfterSubmit::Continue,
            AfterChoice::Logout => AfterSubmit::Logout,
        }
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve configuration: file, then environment, then CLI flags.
pub fn resolve_config(cli: &Cli) -> Result<Config, AppError> {
    let mut config = Config::load(cli.config.as_deref())?.with_env(|key| std::env::var(key).ok())?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir.clone_from(dir);
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;
    let mut app = Workspace::open(config)?;

    match cli.command {
        Some(Commands::Status) | None => cmd_status(&app, json_mode),
        Some(Commands::Fill { section, fields }) => cmd_fill(&mut app, section, fields).await,
        Some(Commands::Edit { section }) => cmd_edit(&mut app, section),
        Some(Commands::Goto { step }) => cmd_goto(&mut app, step),
        Some(Commands::Attach { slot, file }) => cmd_attach(&mut app, slot, &file).await,
        Some(Commands::Preview { slot, output }) => {
            cmd_preview(&mut app, slot, output.as_deref(), json_mode).await
        }
        Some(Commands::Review) => cmd_review(&app, json_mode).await,
        Some(Commands::Submit { retries, then }) => {
            cmd_submit(&mut app, retries, then.into(), json_mode).await
        }
        Some(Commands::Logout) => cmd_logout(&mut app).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_split_on_first_equals() {
        assert_eq!(
            parse_assignment("email=a=b@x.io"),
            Ok(("email".to_string(), "a=b@x.io".to_string()))
        );
        assert!(parse_assignment("firstName").is_err());
        assert!(parse_assignment("=Ama").is_err());
    }

    #[test]
    fn parses_fill_command() {
        let cli = Cli::try_parse_from([
            "enrol",
            "fill",
            "Personal",
            "firstName=Ama",
            "lastName=Owusu",
        ])
        .expect("parse");

        let Some(Commands::Fill { section, fields }) = cli.command else {
            unreachable!("expected fill");
        };
        assert_eq!(section, Section::Personal);
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn parses_document_slot_and_step() {
        let cli = Cli::try_parse_from(["enrol", "attach", "passportPhoto", "-f", "me.png"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Attach {
                slot: DocumentSlot::PassportPhoto,
                ..
            })
        ));

        let cli = Cli::try_parse_from(["enrol", "goto", "review"]).expect("parse");
        assert!(matches!(cli.command, Some(Commands::Goto { step: Step::Review })));
    }
}
