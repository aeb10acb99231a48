use std::sync::Arc;

use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{info, Instrument};

use crate::{
    present::ReportView,
    submit::Submitter,
    types::DocumentFile,
    wizard::{Completion, Wizard, WizardError, WizardSnapshot},
};

/// A wizard wired to a submitter.
///
/// Submissions run on a spawned task so the caller keeps control while the
/// request is in flight. The wizard sits behind one lock; each operation,
/// including applying a completion, is a single locked step.
#[derive(Clone)]
pub struct Session {
    wizard: Arc<Mutex<Wizard>>,
    submitter: Arc<dyn Submitter>,
}

impl Session {
    pub fn new(submitter: Arc<dyn Submitter>) -> Self {
        Self {
            wizard: Arc::new(Mutex::new(Wizard::new())),
            submitter,
        }
    }

    pub async fn submit_context(&self, text: &str) -> Result<(), WizardError> {
        self.wizard.lock().await.submit_context(text)
    }

    pub async fn select_file(&self, file: DocumentFile) -> Result<(), WizardError> {
        self.wizard.lock().await.select_file(file)
    }

    pub async fn go_back(&self) -> Result<(), WizardError> {
        self.wizard.lock().await.go_back()
    }

    /// Start a submission in the background.
    ///
    /// Returns `None` when the wizard refuses (no file, or one already in
    /// flight). The handle resolves once the outcome has been applied or
    /// discarded as stale.
    pub async fn start_analysis(&self) -> Option<JoinHandle<Completion>> {
        let ticket = self.wizard.lock().await.start_analysis()?;
        let wizard = Arc::clone(&self.wizard);
        let submitter = Arc::clone(&self.submitter);
        let span = tracing::info_span!("submission", file = %ticket.file.name());

        Some(tokio::spawn(
            async move {
                let outcome = submitter.submit(&ticket.context, &ticket.file).await;
                let completion = wizard.lock().await.complete(ticket.token, outcome);
                if completion == Completion::Stale {
                    info!("submission finished after being superseded");
                }
                completion
            }
            .instrument(span),
        ))
    }

    pub async fn reset(&self) {
        self.wizard.lock().await.reset();
    }

    pub async fn snapshot(&self) -> WizardSnapshot {
        self.wizard.lock().await.snapshot()
    }

    pub async fn report(&self) -> Option<ReportView> {
        self.wizard.lock().await.report()
    }
}
