use super::super::domain::{CategoryResult, EvaluationResult, ScanStatus};
use super::config::CategoryRule;
use super::rules::PacketEvidence;

/// Run every rule against the packet and fold the outcomes into a scored result.
pub(crate) fn aggregate(rules: &[CategoryRule], evidence: &PacketEvidence<'_>) -> EvaluationResult {
    let mut score: u32 = 0;
    let mut critical_failure = false;
    let mut minor_failure = false;
    let mut sections = Vec::with_capacity(rules.len());

    for rule in rules {
        let pass = (rule.predicate)(evidence);
        if pass {
            score += u32::from(rule.weight);
        } else if rule.critical {
            critical_failure = true;
        } else {
            minor_failure = true;
        }

        sections.push(CategoryResult {
            name: rule.category,
            pass,
            details: if pass {
                String::new()
            } else {
                rule.details.clone()
            },
        });
    }

    let status = decide_status(critical_failure, minor_failure);
    let fixes = sections
        .iter()
        .filter(|section| !section.pass)
        .map(|section| section.details.clone())
        .filter(|details| !details.is_empty())
        .collect();

    EvaluationResult {
        score: score.min(100) as u8,
        status,
        sections,
        fixes,
    }
}

pub(crate) fn decide_status(critical_failure: bool, minor_failure: bool) -> ScanStatus {
    if critical_failure {
        ScanStatus::Red
    } else if minor_failure {
        ScanStatus::Amber
    } else {
        ScanStatus::Green
    }
}
