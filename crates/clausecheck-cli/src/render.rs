use std::fmt::Write;

use clausecheck_core::present::{ClauseView, Findings, ReportView, RiskCategory};
use owo_colors::{OwoColorize, Style};

fn category_style(category: RiskCategory) -> Style {
    match category {
        RiskCategory::Alert => Style::new().red().bold(),
        RiskCategory::Caution => Style::new().yellow().bold(),
        RiskCategory::Safe => Style::new().green().bold(),
        RiskCategory::Neutral => Style::new().blue().bold(),
    }
}

fn heading(out: &mut String, title: &str, color: bool) {
    if color {
        let _ = writeln!(out, "\n{}", title.bold().underline());
    } else {
        let _ = writeln!(out, "\n{title}");
    }
}

fn clause(out: &mut String, index: usize, clause: &ClauseView, color: bool) {
    let label = if color {
        clause
            .risk_label
            .style(category_style(clause.category))
            .to_string()
    } else {
        clause.risk_label.clone()
    };
    let _ = writeln!(out, "\n{}. [{label}]", index + 1);
    let _ = writeln!(out, "   \"{}\"", clause.clause_text);
    let _ = writeln!(out, "   Why it matters: {}", clause.explanation);
    let _ = writeln!(out, "   Recommendation: {}", clause.recommendation);
}

/// Render a report as terminal text. `color` toggles ANSI styling.
pub fn report(view: &ReportView, color: bool) -> String {
    let mut out = String::new();

    if let Some(warning) = &view.context_warning {
        heading(&mut out, "Context mismatch", color);
        let _ = writeln!(out, "{warning}");
    }
    if let Some(notice) = &view.service_notice {
        heading(&mut out, "Service notice", color);
        let _ = writeln!(out, "{notice}");
    }

    heading(&mut out, "Summary", color);
    let _ = writeln!(out, "{}", view.summary);

    match &view.findings {
        Findings::NoIssuesFound => {
            heading(&mut out, "Flagged clauses", color);
            let _ = writeln!(out, "No issues found.");
        },
        Findings::Flagged(clauses) => {
            heading(
                &mut out,
                &format!("Flagged clauses ({})", clauses.len()),
                color,
            );
            for (i, c) in clauses.iter().enumerate() {
                clause(&mut out, i, c, color);
            }
        },
    }

    heading(&mut out, "Overall recommendation", color);
    let _ = writeln!(out, "{}", view.overall_recommendation);
    out
}
