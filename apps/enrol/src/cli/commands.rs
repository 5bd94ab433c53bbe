//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::{AppError, Config, DocumentVault, SubmitClient, Submitter};
use enrol_core::documents::reconcile;
use enrol_core::preview::decode_data_uri;
use enrol_core::review::summary;
use enrol_core::validation::{self, normalize_input};
use enrol_core::{
    AfterSubmit, DocumentSlot, EnrolError, FileKvStore, FormData, Navigator, PreviewResolver,
    PreviewSource, Section, SectionRecord, Step, StepOutcome, StoredDocument, ValidationReport,
    WizardSession, validate_all,
};
use std::path::Path;

// =============================================================================
// WORKSPACE
// =============================================================================

/// Everything a command needs: configuration, wizard session, document
/// vault and the in-memory preview tiers.
#[derive(Debug)]
pub struct Workspace {
    config: Config,
    session: WizardSession<FileKvStore>,
    vault: DocumentVault,
    previews: PreviewResolver,
}

impl Workspace {
    /// Open the stores under the configured data directory.
    pub fn open(config: Config) -> Result<Self, AppError> {
        let kv = FileKvStore::open(config.state_dir())?;
        let vault = DocumentVault::open(config.documents_db())?;
        tracing::debug!(data_dir = %config.data_dir.display(), "workspace opened");
        Ok(Self {
            session: WizardSession::open(kv),
            config,
            vault,
            previews: PreviewResolver::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &WizardSession<FileKvStore> {
        &self.session
    }

    #[must_use]
    pub fn vault(&self) -> &DocumentVault {
        &self.vault
    }

    /// Resolve a slot's preview: memory first, then the stored bundle.
    ///
    /// A stored preview is remembered as the slot's recent state.
    pub async fn preview(&mut self, slot: DocumentSlot) -> Option<(String, PreviewSource)> {
        let bundle = self.vault.load_document_data().await;
        let resolved = self
            .previews
            .resolve(slot, bundle.as_ref())
            .map(|(uri, source)| (uri.to_string(), source));
        if let Some((uri, PreviewSource::Durable)) = &resolved {
            self.previews.set_recent(slot, uri.clone());
        }
        resolved
    }

    /// The form with documents whose blob is gone dropped from it.
    pub async fn reconciled_form(&self) -> FormData {
        let bundle = self.vault.load_document_data().await;
        let mut form = self.session.form().clone();
        form.documents = reconcile(&form.documents, bundle.as_ref());
        form
    }
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn print_report(section: Section, report: &ValidationReport) {
    println!("{} was not saved:", section.title());
    for label in &report.missing_fields {
        println!("  - {} is required", label);
    }
    for error in &report.errors {
        let label = validation::field(section, &error.field)
            .map(|spec| spec.label)
            .unwrap_or(error.field.as_str());
        println!("  - {}: {}", label, error.message);
    }
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show progress through the wizard.
pub fn cmd_status(app: &Workspace, json_mode: bool) -> Result<(), AppError> {
    let form = app.session.form();
    let navigator = app.session.navigator();
    let progress = app.session.progress();

    if json_mode {
        print_json(&serde_json::json!({
            "applicant": form.applicant_name(),
            "initials": form.applicant_initials(),
            "current": navigator.current(),
            "editing": navigator.is_editing(),
            "steps": progress,
        }));
        return Ok(());
    }

    println!("Enrol Application Status");
    println!("========================");
    println!(
        "Applicant: {} ({})",
        form.applicant_name(),
        form.applicant_initials()
    );
    if navigator.is_editing() {
        println!("Editing:   {}", navigator.current().title());
    }
    println!();
    for status in progress {
        let marker = if status.current {
            ">"
        } else if status.completed {
            "x"
        } else if status.reachable {
            " "
        } else {
            "-"
        };
        println!("  [{}] {}", marker, status.title);
    }
    Ok(())
}

// =============================================================================
// FILL COMMAND
// =============================================================================

/// Save the given fields of a section and advance.
pub async fn cmd_fill(
    app: &mut Workspace,
    section: Section,
    fields: Vec<(String, String)>,
) -> Result<(), AppError> {
    let patch = if section == Section::Documents {
        if !fields.is_empty() {
            return Err(AppError::Usage(
                "documents are added with `enrol attach`, not `fill`".to_string(),
            ));
        }
        missing_blob_patch(app).await
    } else {
        fields
            .into_iter()
            .map(|(key, value)| {
                if validation::field(section, &key).is_none() {
                    tracing::warn!(%section, field = %key, "unknown field");
                }
                let value = normalize_input(section, &key, &value);
                (key, value)
            })
            .collect()
    };

    match app.session.save_section(section, &patch)? {
        StepOutcome::Advanced(next) => {
            println!("Saved {}. Next: {}", section.title(), next.title());
            Ok(())
        }
        StepOutcome::Rejected(report) => {
            print_report(section, &report);
            Err(AppError::SectionRejected(section))
        }
    }
}

/// Blank the file names whose blob is no longer stored.
async fn missing_blob_patch(app: &Workspace) -> SectionRecord {
    let recorded = &app.session.form().documents;
    let bundle = app.vault.load_document_data().await;
    let reconciled = reconcile(recorded, bundle.as_ref());
    DocumentSlot::ALL
        .iter()
        .filter(|slot| recorded.get(slot.key()).is_some() && reconciled.get(slot.key()).is_none())
        .map(|slot| (slot.key(), ""))
        .collect()
}

// =============================================================================
// NAVIGATION COMMANDS
// =============================================================================

/// Enter edit mode for a section.
pub fn cmd_edit(app: &mut Workspace, section: Section) -> Result<(), AppError> {
    app.session.begin_edit(section)?;
    println!("Editing {}. Saving it returns to review.", section.title());
    Ok(())
}

/// Move directly to a step.
pub fn cmd_goto(app: &mut Workspace, step: Step) -> Result<(), AppError> {
    let step = app.session.goto(step)?;
    println!("Now at {}.", step.title());
    Ok(())
}

// =============================================================================
// DOCUMENT COMMANDS
// =============================================================================

/// Upload a file into a document slot.
pub async fn cmd_attach(
    app: &mut Workspace,
    slot: DocumentSlot,
    file: &Path,
) -> Result<(), AppError> {
    if !Navigator::is_reachable(Step::Documents, app.session.form()) {
        return Err(EnrolError::StepLocked(Step::Documents).into());
    }

    let metadata = std::fs::metadata(file)
        .map_err(|e| AppError::Io(format!("Cannot read '{}': {}", file.display(), e)))?;
    if !metadata.is_file() {
        return Err(AppError::Io(format!(
            "'{}' is not a regular file",
            file.display()
        )));
    }
    // Refuse before reading the whole file into memory.
    if metadata.len() > slot.max_size() {
        return Err(EnrolError::FileTooLarge {
            slot: slot.label().to_string(),
            size: metadata.len(),
            max: slot.max_size(),
        }
        .into());
    }

    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| AppError::Io(format!("Cannot read '{}': {}", file.display(), e)))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::Io(format!("'{}' has no file name", file.display())))?;

    let document = StoredDocument::new(slot, file_name, bytes)?;
    app.vault.store_document(slot, document.clone()).await?;
    // Name is recorded only once the bytes are stored.
    app.session.record_document(slot, &document)?;
    app.previews.record_upload(slot, document.preview.clone());

    println!(
        "Attached {} as {} ({} bytes).",
        document.file_name,
        slot.label(),
        document.bytes.len()
    );
    Ok(())
}

/// Describe an uploaded document, or write it back out.
pub async fn cmd_preview(
    app: &mut Workspace,
    slot: DocumentSlot,
    output: Option<&Path>,
    json_mode: bool,
) -> Result<(), AppError> {
    let Some((uri, source)) = app.preview(slot).await else {
        println!("No {} uploaded.", slot.label());
        return Ok(());
    };
    let (content_type, bytes) = decode_data_uri(&uri)?;
    tracing::debug!(slot = slot.key(), ?source, "preview resolved");

    if let Some(path) = output {
        std::fs::write(path, &bytes)
            .map_err(|e| AppError::Io(format!("Cannot write '{}': {}", path.display(), e)))?;
        println!("Wrote {} to {}.", slot.label(), path.display());
        return Ok(());
    }

    let file_name = app
        .session
        .form()
        .documents
        .get(slot.key())
        .unwrap_or_default();

    if json_mode {
        print_json(&serde_json::json!({
            "slot": slot.key(),
            "file_name": file_name,
            "content_type": content_type,
            "size": bytes.len(),
        }));
        return Ok(());
    }

    println!("{}: {} ({}, {} bytes)", slot.label(), file_name, content_type, bytes.len());
    Ok(())
}

// =============================================================================
// REVIEW COMMAND
// =============================================================================

/// Print the application summary and any missing fields.
pub async fn cmd_review(app: &Workspace, json_mode: bool) -> Result<(), AppError> {
    let form = app.reconciled_form().await;
    let report = validate_all(&form);

    if json_mode {
        let sections: serde_json::Map<String, serde_json::Value> = summary(&form)
            .into_iter()
            .map(|(section, rows)| (section.to_string(), serde_json::json!(rows)))
            .collect();
        print_json(&serde_json::json!({
            "summary": sections,
            "has_missing": report.has_missing,
            "missing_by_section": report.missing_by_section,
        }));
        return Ok(());
    }

    for (section, rows) in summary(&form) {
        println!("{}", section.title());
        println!("{}", "-".repeat(section.title().len()));
        for row in rows {
            println!("  {:<30} {}", row.label, row.value);
        }
        println!();
    }

    if report.has_missing {
        println!("Missing before submission:");
        for (section, labels) in &report.missing_by_section {
            println!("  {}: {}", section.title(), labels.join(", "));
        }
    } else {
        println!("Ready to submit.");
    }
    Ok(())
}

// =============================================================================
// SUBMIT COMMAND
// =============================================================================

/// Submit the application, retrying up to `retries` times on failure.
pub async fn cmd_submit(
    app: &mut Workspace,
    retries: u32,
    then: AfterSubmit,
    json_mode: bool,
) -> Result<(), AppError> {
    let form = app.reconciled_form().await;
    let report = validate_all(&form);
    if report.has_missing {
        for (section, labels) in &report.missing_by_section {
            println!("{}: {}", section.title(), labels.join(", "));
        }
        return Err(AppError::Incomplete(report.missing_by_section.len()));
    }

    let client = SubmitClient::from_config(&app.config)?;
    let mut submitter = Submitter::new(client);

    let mut result = submitter.submit(&form).await;
    let mut remaining = retries;
    while result.is_err() && remaining > 0 {
        remaining -= 1;
        result = submitter.retry().await;
    }
    let ack = result?;

    if json_mode {
        print_json(&serde_json::json!({
            "submitted": true,
            "applicant": form.applicant_name(),
            "ack": ack,
        }));
    } else {
        println!(
            "Application for {} submitted (HTTP {}).",
            form.applicant_name(),
            ack.status
        );
    }

    if submitter.finish(then, &mut app.session, &app.vault).await? == AfterSubmit::Logout {
        app.previews.clear();
        println!("Saved data cleared.");
    }
    Ok(())
}

// =============================================================================
// LOGOUT COMMAND
// =============================================================================

/// Erase the form, the session and the documents.
pub async fn cmd_logout(app: &mut Workspace) -> Result<(), AppError> {
    app.session.logout()?;
    app.vault.clear_document_data().await?;
    app.previews.clear();
    println!("Logged out. All saved data was removed.");
    Ok(())
}
