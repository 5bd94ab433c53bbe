//! # Submission
//!
//! Couples the core `SubmissionTracker` with the HTTP client. A failed
//! attempt keeps its payload; `retry` sends exactly that payload again,
//! whatever happened to the form in between.

use crate::client::{Ack, SubmitClient};
use crate::{AppError, DocumentVault};
use enrol_core::{
    AfterSubmit, FormData, KeyValueStore, SubmissionState, SubmissionTracker, WizardSession,
};

#[derive(Debug)]
pub struct Submitter {
    tracker: SubmissionTracker<Ack>,
    client: SubmitClient,
}

impl Submitter {
    pub fn new(client: SubmitClient) -> Self {
        Self {
            tracker: SubmissionTracker::new(),
            client,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SubmissionState<Ack> {
        self.tracker.state()
    }

    /// Send `form`. Refused while another attempt is outstanding.
    pub async fn submit(&mut self, form: &FormData) -> Result<Ack, AppError> {
        let payload = self.tracker.begin(form)?;
        self.send(payload).await
    }

    /// Re-send the payload of the last failed attempt.
    pub async fn retry(&mut self) -> Result<Ack, AppError> {
        let payload = self.tracker.retry()?;
        tracing::info!("retrying submission");
        self.send(payload).await
    }

    /// Close the confirmation. `Logout` wipes the form, the session and the
    /// document bundle.
    pub async fn finish<S: KeyValueStore>(
        &mut self,
        choice: AfterSubmit,
        session: &mut WizardSession<S>,
        vault: &DocumentVault,
    ) -> Result<AfterSubmit, AppError> {
        let choice = self.tracker.acknowledge(choice);
        if choice == AfterSubmit::Logout {
            session.logout()?;
            vault.clear_document_data().await?;
            tracing::info!("logged out after submission");
        }
        Ok(choice)
    }

    async fn send(&mut self, payload: FormData) -> Result<Ack, AppError> {
        match self.client.submit(&payload).await {
            Ok(ack) => {
                tracing::info!(status = ack.status, url = self.client.url(), "application submitted");
                self.tracker.succeed(ack.clone());
                Ok(ack)
            }
            Err(e) => {
                tracing::warn!(error = %e, "submission failed");
                self.tracker.fail(&e);
                Err(e.into())
            }
        }
    }
}
