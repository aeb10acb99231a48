use tracing::{debug, info, warn};

use crate::{
    present::{present, ReportView},
    submit::SubmissionError,
    types::{AnalysisResult, DocumentFile, MAX_UPLOAD_BYTES},
};

/// Identifies one `start_analysis` attempt. A completion is applied only
/// while its token is still the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionToken(u64);

/// Internal wizard state. Each variant carries only what is valid in it.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    ContextEntry,
    FileSelection { last_error: Option<String> },
    Analyzing { token: SubmissionToken },
    Results { result: AnalysisResult },
}

/// The step the user sees. `Analyzing` is shown as `FileSelection` with a
/// submission in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepKind {
    #[default]
    ContextEntry,
    FileSelection,
    Results,
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::ContextEntry => StepKind::ContextEntry,
            Self::FileSelection { .. } | Self::Analyzing { .. } => StepKind::FileSelection,
            Self::Results { .. } => StepKind::Results,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::ContextEntry => "context_entry",
            Self::FileSelection { .. } => "file_selection",
            Self::Analyzing { .. } => "analyzing",
            Self::Results { .. } => "results",
        }
    }
}

/// Local validation failures. These never reach the network and are not
/// stored as `last_error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("describe the document before continuing")]
    EmptyContext,
    #[error("{name} is {size} bytes, larger than the {limit} byte upload limit")]
    FileTooLarge { name: String, size: u64, limit: u64 },
    #[error("cannot {action} while {step}")]
    NotAvailable {
        action: &'static str,
        step: &'static str,
    },
}

/// Everything `start_analysis` hands to the submitter.
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    pub token: SubmissionToken,
    pub context: String,
    pub file: DocumentFile,
}

/// Whether a completion changed the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

/// Flattened, comparable view of the wizard's fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardSnapshot {
    pub step: StepKind,
    pub context: String,
    pub selected_file: Option<DocumentFile>,
    pub is_submitting: bool,
    pub last_error: Option<String>,
    pub result: Option<AnalysisResult>,
}

/// The three-step submission flow: context, file, results.
#[derive(Debug, Clone)]
pub struct Wizard {
    context: String,
    selected_file: Option<DocumentFile>,
    step: Step,
    /// Tokens issued so far. Survives `reset` so older tokens stay stale.
    issued: u64,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            context: String::new(),
            selected_file: None,
            step: Step::ContextEntry,
            issued: 0,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn step_kind(&self) -> StepKind {
        self.step.kind()
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn selected_file(&self) -> Option<&DocumentFile> {
        self.selected_file.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.step, Step::Analyzing { .. })
    }

    pub fn last_error(&self) -> Option<&str> {
        match &self.step {
            Step::FileSelection { last_error } => last_error.as_deref(),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.step {
            Step::Results { result } => Some(result),
            _ => None,
        }
    }

    /// Report for the current result; `None` until an analysis succeeds.
    pub fn report(&self) -> Option<ReportView> {
        self.result().map(present)
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            step: self.step_kind(),
            context: self.context.clone(),
            selected_file: self.selected_file.clone(),
            is_submitting: self.is_submitting(),
            last_error: self.last_error().map(str::to_string),
            result: self.result().cloned(),
        }
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Store the document context and move on to file selection.
    pub fn submit_context(&mut self, text: &str) -> Result<(), WizardError> {
        if !matches!(self.step, Step::ContextEntry) {
            return Err(self.not_available("submit context"));
        }
        if text.trim().is_empty() {
            return Err(WizardError::EmptyContext);
        }
        self.context = text.to_string();
        self.step = Step::FileSelection { last_error: None };
        info!(context_len = text.len(), "context accepted");
        Ok(())
    }

    /// Remember the chosen document. Allowed while a submission is running;
    /// the running submission keeps the file it started with.
    pub fn select_file(&mut self, file: DocumentFile) -> Result<(), WizardError> {
        if !matches!(self.step, Step::FileSelection { .. } | Step::Analyzing { .. }) {
            return Err(self.not_available("select a file"));
        }
        if file.size() > MAX_UPLOAD_BYTES {
            return Err(WizardError::FileTooLarge {
                name: file.name().to_string(),
                size: file.size(),
                limit: MAX_UPLOAD_BYTES,
            });
        }
        info!(file = %file.name(), bytes = file.size(), "file selected");
        self.selected_file = Some(file);
        Ok(())
    }

    /// Return from file selection to context entry, keeping the context.
    pub fn go_back(&mut self) -> Result<(), WizardError> {
        if !matches!(self.step, Step::FileSelection { .. }) {
            return Err(self.not_available("go back"));
        }
        self.step = Step::ContextEntry;
        Ok(())
    }

    /// Begin a submission. Returns `None` (and changes nothing) unless a file
    /// is selected and no submission is already running.
    pub fn start_analysis(&mut self) -> Option<SubmissionTicket> {
        if !matches!(self.step, Step::FileSelection { .. }) {
            debug!(step = self.step.name(), "start_analysis ignored");
            return None;
        }
        let file = self.selected_file.clone()?;

        self.issued += 1;
        let token = SubmissionToken(self.issued);
        self.step = Step::Analyzing { token };
        info!(
            attempt = self.issued,
            file = %file.name(),
            bytes = file.size(),
            "analysis started"
        );
        Some(SubmissionTicket {
            token,
            context: self.context.clone(),
            file,
        })
    }

    /// Apply the outcome of the submission identified by `token`.
    ///
    /// `result`, `last_error`, the submitting flag and the step change in
    /// this single call. Outcomes for superseded tokens are dropped.
    pub fn complete(
        &mut self,
        token: SubmissionToken,
        outcome: Result<AnalysisResult, SubmissionError>,
    ) -> Completion {
        match self.step {
            Step::Analyzing { token: current } if current == token => {},
            _ => {
                debug!(attempt = token.0, "ignoring stale analysis outcome");
                return Completion::Stale;
            },
        }

        self.step = match outcome {
            Ok(result) => {
                info!(
                    attempt = token.0,
                    flagged = result.flagged_clauses.len(),
                    "analysis complete"
                );
                Step::Results { result }
            },
            Err(e) => {
                warn!(attempt = token.0, "analysis failed: {}", e);
                Step::FileSelection {
                    last_error: Some(e.user_message()),
                }
            },
        };
        Completion::Applied
    }

    /// Drop every field back to its initial value. A running submission is
    /// not cancelled, but its outcome will be ignored.
    pub fn reset(&mut self) {
        if self.is_submitting() {
            info!("reset while analysis in flight; its outcome will be discarded");
        }
        *self = Self {
            issued: self.issued,
            ..Self::new()
        };
    }

    fn not_available(&self, action: &'static str) -> WizardError {
        WizardError::NotAvailable {
            action,
            step: self.step.name(),
        }
    }
}
