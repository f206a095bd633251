use crate::rules::MatchResult;
use crate::EvaluationReport;

/// Render a report as a findings table, most urgent maturity level first.
pub fn render(report: &EvaluationReport) -> String {
    let evaluation = &report.evaluation;
    let mut output = String::new();

    output.push_str(&format!(
        "\n  Tenant: {}  (evaluated {})\n",
        report.tenant_name,
        report.evaluated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    ));

    if evaluation.matches.is_empty() {
        output.push_str("\n  No risk rules triggered.\n");
    } else {
        let mut sorted: Vec<&MatchResult> = evaluation.matches.iter().collect();
        sorted.sort_by(|a, b| {
            maturity_rank(a)
                .cmp(&maturity_rank(b))
                .then_with(|| b.points.cmp(&a.points))
        });

        output.push_str(&format!(
            "\n  {} rule(s) triggered:\n\n",
            evaluation.matches.len()
        ));
        for m in sorted {
            let level = if m.maturity_level > 0 {
                format!("[M{}]", m.maturity_level)
            } else {
                "[M-]".into()
            };
            let title = if m.title.is_empty() {
                "(unknown rule)"
            } else {
                m.title.as_str()
            };
            output.push_str(&format!(
                "  {} {:<26} {:>4} pts  {}\n",
                level, m.risk_id, m.points, title
            ));
            if !m.evidence.is_empty() {
                output.push_str(&format!("           details: {}\n", m.evidence.join(", ")));
            }
        }
    }

    if !evaluation.failures.is_empty() {
        output.push_str(&format!(
            "\n  {} rule(s) failed and were excluded:\n",
            evaluation.failures.len()
        ));
        for failure in &evaluation.failures {
            output.push_str(&format!(
                "  [ERROR] {} ({}): {}\n",
                failure.risk_id, failure.rule_type, failure.error
            ));
        }
    }

    if !evaluation.skipped.is_empty() {
        output.push_str(&format!(
            "\n  Skipped after deadline: {}\n",
            evaluation.skipped.join(", ")
        ));
    }

    for unknown in &report.unknown_overrides {
        match &unknown.suggestion {
            Some(suggestion) => output.push_str(&format!(
                "\n  warning: {} (did you mean {}?)\n",
                unknown, suggestion
            )),
            None => output.push_str(&format!("\n  warning: {}\n", unknown)),
        }
    }

    output.push_str(&format!(
        "\n  Result: score {}, maturity level {}\n\n",
        evaluation.score.global_score, evaluation.score.maturity_level
    ));

    output
}

fn maturity_rank(m: &MatchResult) -> i32 {
    if m.maturity_level > 0 {
        m.maturity_level
    } else {
        i32::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Evaluation, RuleFailure, ScoreSummary, UnknownOverride};
    use chrono::Utc;
    use uuid::Uuid;

    fn report(matches: Vec<MatchResult>) -> EvaluationReport {
        EvaluationReport {
            run_id: Uuid::new_v4(),
            evaluated_at: Utc::now(),
            tenant_name: "contoso".into(),
            snapshot_digest: None,
            regenerated: false,
            evaluation: Evaluation {
                matches,
                failures: vec![],
                skipped: vec![],
                score: ScoreSummary {
                    global_score: 20,
                    maturity_level: 1,
                },
            },
            unknown_overrides: vec![],
        }
    }

    fn matched(risk_id: &str, points: u32, maturity_level: i32) -> MatchResult {
        MatchResult {
            risk_id: risk_id.into(),
            title: format!("{risk_id} title"),
            points,
            maturity_level,
            evidence: vec!["1.6.4.0".into()],
        }
    }

    #[test]
    fn lists_most_urgent_first() {
        let out = render(&report(vec![matched("Low", 5, 2), matched("Urgent", 15, 1)]));
        let urgent = out.find("Urgent").unwrap();
        let low = out.find("Low").unwrap();
        assert!(urgent < low);
        assert!(out.contains("details: 1.6.4.0"));
        assert!(out.contains("Result: score 20, maturity level 1"));
    }

    #[test]
    fn clean_run() {
        let out = render(&report(vec![]));
        assert!(out.contains("No risk rules triggered"));
    }

    #[test]
    fn shows_failures_and_unknown_overrides() {
        let mut r = report(vec![]);
        r.evaluation.failures.push(RuleFailure {
            risk_id: "Broken".into(),
            rule_type: "BrokenRule".into(),
            error: "boom".into(),
        });
        r.unknown_overrides.push(UnknownOverride {
            risk_id: "ADConectVersion".into(),
            suggestion: Some("ADConnectVersion".into()),
        });

        let out = render(&r);
        assert!(out.contains("[ERROR] Broken (BrokenRule): boom"));
        assert!(out.contains("did you mean ADConnectVersion?"));
    }
}
