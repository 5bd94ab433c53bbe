//! # Enrol - Admission Intake
//!
//! Command-line front-end for the admission wizard.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                  apps/enrol (THE BINARY)                  │
//! │                                                           │
//! │  ┌─────────────┐   ┌──────────────┐   ┌───────────────┐  │
//! │  │    CLI      │   │ DocumentVault│   │ SubmitClient  │  │
//! │  │   (clap)    │   │ (blocking IO)│   │  (reqwest)    │  │
//! │  └──────┬──────┘   └──────┬───────┘   └───────┬───────┘  │
//! │         └─────────────────┼───────────────────┘          │
//! │                           ▼                              │
//! │                   ┌───────────────┐                      │
//! │                   │  enrol-core   │                      │
//! │                   │  (THE LOGIC)  │                      │
//! │                   └───────────────┘                      │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! enrol fill personal firstName=Ama lastName=Owusu gender=Female ...
//! enrol attach passportPhoto -f photo.jpg
//! enrol review
//! enrol submit --retries 2 --then logout
//! ```

use clap::Parser;
use enrol::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // ENROL_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("ENROL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "enrol=warn,enrol_core=warn".into());

    // Logs go to stderr; stdout carries command output.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
