//! Maps an [`AnalysisResult`] to what the report screen shows.
//!
//! Pure: no I/O, no errors. Every clause in the payload appears in the view,
//! in the order the service reported it.

use serde::Serialize;

use crate::types::{AnalysisResult, Clause, RiskLevel};

/// Display category for a clause's risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Alert,
    Caution,
    Safe,
    Neutral,
}

impl From<&RiskLevel> for RiskCategory {
    fn from(level: &RiskLevel) -> Self {
        match level {
            RiskLevel::High => Self::Alert,
            RiskLevel::Medium => Self::Caution,
            RiskLevel::Low => Self::Safe,
            RiskLevel::Unknown(_) => Self::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClauseView {
    pub category: RiskCategory,
    /// e.g. "High Risk"; "Unrated Risk" when the service gave no level.
    pub risk_label: String,
    pub clause_text: String,
    pub explanation: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "clauses", rename_all = "snake_case")]
pub enum Findings {
    NoIssuesFound,
    Flagged(Vec<ClauseView>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportView {
    pub summary: String,
    pub context_warning: Option<String>,
    /// Notice the service embedded in a degraded analysis.
    pub service_notice: Option<String>,
    pub findings: Findings,
    pub overall_recommendation: String,
}

impl ReportView {
    pub fn flagged_count(&self) -> usize {
        match &self.findings {
            Findings::NoIssuesFound => 0,
            Findings::Flagged(clauses) => clauses.len(),
        }
    }
}

pub fn present(result: &AnalysisResult) -> ReportView {
    let findings = if result.flagged_clauses.is_empty() {
        Findings::NoIssuesFound
    } else {
        Findings::Flagged(result.flagged_clauses.iter().map(present_clause).collect())
    };

    ReportView {
        summary: result.summary.clone(),
        context_warning: non_blank(result.context_match_warning.as_deref()),
        service_notice: non_blank(result.service_error.as_deref()),
        findings,
        overall_recommendation: result.overall_recommendation.clone(),
    }
}

fn present_clause(clause: &Clause) -> ClauseView {
    let level = clause.risk_level.as_str().trim();
    let risk_label = if level.is_empty() {
        "Unrated Risk".to_string()
    } else {
        format!("{level} Risk")
    };
    ClauseView {
        category: RiskCategory::from(&clause.risk_level),
        risk_label,
        clause_text: clause.clause_text.clone(),
        explanation: clause.explanation.clone(),
        recommendation: clause.recommendation.clone(),
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
