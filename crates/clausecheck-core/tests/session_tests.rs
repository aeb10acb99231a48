// Drives `Session` end to end against in-memory submitters.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing_test::traced_test;

use clausecheck_core::{
    present::{Findings, RiskCategory},
    session::Session,
    submit::{SubmissionError, Submitter, CONNECTIVITY_MESSAGE},
    types::{AnalysisResult, Clause, DocumentFile, RiskLevel},
    wizard::{Completion, StepKind, WizardSnapshot},
};

// ── fakes ────────────────────────────────────────────────────────────────────

/// Returns the same outcome for every call and records what it was sent.
struct FixedSubmitter {
    outcome: Result<AnalysisResult, SubmissionError>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FixedSubmitter {
    fn new(outcome: Result<AnalysisResult, SubmissionError>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Submitter for FixedSubmitter {
    async fn submit(
        &self,
        context: &str,
        file: &DocumentFile,
    ) -> Result<AnalysisResult, SubmissionError> {
        self.calls
            .lock()
            .unwrap()
            .push((context.to_string(), file.name().to_string()));
        self.outcome.clone()
    }
}

/// Blocks each submission until the test releases it.
struct GatedSubmitter {
    gate: tokio::sync::Mutex<Option<oneshot::Receiver<Result<AnalysisResult, SubmissionError>>>>,
    seen_files: Mutex<Vec<String>>,
}

impl GatedSubmitter {
    fn new() -> (Arc<Self>, oneshot::Sender<Result<AnalysisResult, SubmissionError>>) {
        let (tx, rx) = oneshot::channel();
        let submitter = Arc::new(Self {
            gate: tokio::sync::Mutex::new(Some(rx)),
            seen_files: Mutex::new(Vec::new()),
        });
        (submitter, tx)
    }
}

#[async_trait]
impl Submitter for GatedSubmitter {
    async fn submit(
        &self,
        _context: &str,
        file: &DocumentFile,
    ) -> Result<AnalysisResult, SubmissionError> {
        self.seen_files.lock().unwrap().push(file.name().to_string());
        let rx = self.gate.lock().await.take();
        match rx {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(SubmissionError::Transport("gate dropped".into()))),
            None => Err(SubmissionError::Transport("gate already used".into())),
        }
    }
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn pdf(name: &str) -> DocumentFile {
    DocumentFile::new(name, b"%PDF-1.4 sample".to_vec())
}

fn sign_result() -> AnalysisResult {
    serde_json::from_str(r#"{"summary":"ok","flagged_clauses":[],"overall_recommendation":"sign"}"#)
        .unwrap()
}

async fn ready_session(submitter: Arc<dyn Submitter>) -> Session {
    let session = Session::new(submitter);
    session.submit_context("NDA review").await.unwrap();
    session.select_file(pdf("nda.pdf")).await.unwrap();
    session
}

// ── tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn successful_round_trip_reaches_results() {
    let submitter = FixedSubmitter::new(Ok(sign_result()));
    let session = ready_session(submitter.clone()).await;

    let handle = session.start_analysis().await.expect("submission starts");
    assert_eq!(handle.await.unwrap(), Completion::Applied);

    let snap = session.snapshot().await;
    assert_eq!(snap.step, StepKind::Results);
    assert!(!snap.is_submitting);
    assert_eq!(snap.result.as_ref().map(|r| r.flagged_clauses.len()), Some(0));

    let report = session.report().await.expect("report after success");
    assert_eq!(report.findings, Findings::NoIssuesFound);
    assert_eq!(report.overall_recommendation, "sign");

    assert_eq!(
        submitter.calls(),
        vec![("NDA review".to_string(), "nda.pdf".to_string())]
    );
}

#[tokio::test]
async fn service_failure_stays_on_file_selection() {
    let submitter = FixedSubmitter::new(Err(SubmissionError::Service {
        status: 500,
        message: Some("bad document".into()),
    }));
    let session = ready_session(submitter).await;

    session.start_analysis().await.unwrap().await.unwrap();

    let snap = session.snapshot().await;
    assert_eq!(snap.step, StepKind::FileSelection);
    assert_eq!(snap.last_error.as_deref(), Some("bad document"));
    assert!(!snap.is_submitting);
    assert!(snap.result.is_none());
    assert!(session.report().await.is_none());
}

#[tokio::test]
async fn transport_failure_uses_connectivity_message() {
    let submitter = FixedSubmitter::new(Err(SubmissionError::Transport("refused".into())));
    let session = ready_session(submitter.clone()).await;

    session.start_analysis().await.unwrap().await.unwrap();
    assert_eq!(
        session.snapshot().await.last_error.as_deref(),
        Some(CONNECTIVITY_MESSAGE)
    );

    // Retrying is a fresh user action and makes a second call.
    session.start_analysis().await.unwrap().await.unwrap();
    assert_eq!(submitter.calls().len(), 2);
}

#[tokio::test]
async fn start_without_file_does_not_submit() {
    let submitter = FixedSubmitter::new(Ok(sign_result()));
    let session = Session::new(submitter.clone());
    session.submit_context("Lease agreement").await.unwrap();

    assert!(session.start_analysis().await.is_none());
    assert_eq!(session.snapshot().await.step, StepKind::FileSelection);
    assert!(submitter.calls().is_empty());
}

#[tokio::test]
async fn second_start_while_in_flight_is_rejected() {
    let (submitter, release) = GatedSubmitter::new();
    let session = ready_session(submitter.clone()).await;

    let first = session.start_analysis().await.expect("first submission");
    assert!(session.snapshot().await.is_submitting);
    assert!(session.start_analysis().await.is_none());
    assert!(session.start_analysis().await.is_none());

    release.send(Ok(sign_result())).unwrap();
    assert_eq!(first.await.unwrap(), Completion::Applied);
    assert_eq!(submitter.seen_files.lock().unwrap().len(), 1);
    assert_eq!(session.snapshot().await.step, StepKind::Results);
}

#[tokio::test]
#[traced_test]
async fn response_after_reset_is_discarded() {
    let (submitter, release) = GatedSubmitter::new();
    let session = ready_session(submitter).await;

    let pending = session.start_analysis().await.expect("submission starts");
    session.reset().await;

    release.send(Ok(sign_result())).unwrap();
    assert_eq!(pending.await.unwrap(), Completion::Stale);

    assert_eq!(session.snapshot().await, WizardSnapshot::default());
    assert!(session.report().await.is_none());
    assert!(logs_contain("ignoring stale analysis outcome"));
}

#[tokio::test]
async fn file_changed_mid_flight_is_kept_for_next_attempt() {
    let (submitter, release) = GatedSubmitter::new();
    let session = ready_session(submitter.clone()).await;

    let pending = session.start_analysis().await.unwrap();
    session.select_file(pdf("amended.pdf")).await.unwrap();

    release
        .send(Err(SubmissionError::Service {
            status: 400,
            message: Some("Document appears to be too short or mostly empty".into()),
        }))
        .unwrap();
    pending.await.unwrap();

    assert_eq!(submitter.seen_files.lock().unwrap().as_slice(), ["nda.pdf"]);
    let snap = session.snapshot().await;
    assert_eq!(
        snap.selected_file.as_ref().map(DocumentFile::name),
        Some("amended.pdf")
    );
    assert_eq!(
        snap.last_error.as_deref(),
        Some("Document appears to be too short or mostly empty")
    );
}

#[tokio::test]
async fn unknown_risk_level_is_rendered_neutral() {
    let result = AnalysisResult {
        summary: "Supply agreement".into(),
        context_match_warning: Some("Context mentions an NDA; document is a supply agreement".into()),
        flagged_clauses: vec![
            Clause {
                clause_text: "Unlimited liability".into(),
                risk_level: RiskLevel::from("Critical"),
                explanation: "No cap".into(),
                recommendation: "Add a cap".into(),
            },
            Clause {
                clause_text: "Net 90 payment".into(),
                risk_level: RiskLevel::Medium,
                explanation: "Long terms".into(),
                recommendation: "Ask for net 30".into(),
            },
        ],
        overall_recommendation: "Negotiate".into(),
        service_error: None,
    };
    let session = ready_session(FixedSubmitter::new(Ok(result))).await;
    session.start_analysis().await.unwrap().await.unwrap();

    let report = session.report().await.unwrap();
    assert!(report.context_warning.is_some());
    let Findings::Flagged(clauses) = report.findings else {
        panic!("expected flagged clauses");
    };
    assert_eq!(clauses.len(), 2);
    assert_eq!(clauses[0].category, RiskCategory::Neutral);
    assert_eq!(clauses[0].clause_text, "Unlimited liability");
    assert_eq!(clauses[1].category, RiskCategory::Caution);
}

#[tokio::test]
async fn reset_after_results_restores_initial_state() {
    let session = ready_session(FixedSubmitter::new(Ok(sign_result()))).await;
    session.start_analysis().await.unwrap().await.unwrap();
    assert_eq!(session.snapshot().await.step, StepKind::Results);

    session.reset().await;
    assert_eq!(session.snapshot().await, WizardSnapshot::default());

    // The wizard is usable again after a reset.
    session.submit_context("Second document").await.unwrap();
    assert_eq!(session.snapshot().await.step, StepKind::FileSelection);
}
