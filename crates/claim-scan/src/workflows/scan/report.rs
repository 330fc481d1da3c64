use serde::Serialize;

use super::domain::{EvaluationResult, ScanId};

pub const REPORT_TITLE: &str = "Claim Rejection Risk Summary";
pub const MAX_LISTED_FIXES: usize = 5;
const FOOTER: &str = "RH = relative humidity • DSO = days sales outstanding";

/// Human-readable summary of a completed scan.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub scan_id: ScanId,
    pub result: EvaluationResult,
}

impl SummaryReport {
    pub fn new(scan_id: ScanId, result: EvaluationResult) -> Self {
        Self { scan_id, result }
    }

    pub fn file_name(&self) -> String {
        format!("scan-{}-summary.txt", self.scan_id)
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            REPORT_TITLE.to_string(),
            format!(
                "{}/100 {}",
                self.result.score,
                self.result.status.label().to_uppercase()
            ),
            String::new(),
            "Sections".to_string(),
        ];

        lines.extend(self.result.sections.iter().map(|section| {
            let verdict = if section.pass { "Pass" } else { "Fail" };
            if section.details.is_empty() {
                format!("{}: {verdict}", section.name)
            } else {
                format!("{}: {verdict} - {}", section.name, section.details)
            }
        }));

        if !self.result.fixes.is_empty() {
            lines.push(String::new());
            lines.push("Top Fixes".to_string());
            lines.extend(
                self.result
                    .fixes
                    .iter()
                    .take(MAX_LISTED_FIXES)
                    .enumerate()
                    .map(|(position, fix)| format!("{}. {fix}", position + 1)),
            );
        }

        lines.push(String::new());
        lines.push(FOOTER.to_string());
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}
