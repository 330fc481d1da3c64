use serde::{Deserialize, Serialize};

use super::domain::ScanId;

/// File the browser wizard intends to upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub name: String,
    #[serde(rename = "type", default)]
    pub mime: String,
    pub index: u32,
}

/// Signed slot returned to the wizard for a single upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSlot {
    pub index: u32,
    pub path: String,
    pub token: String,
}

pub fn scan_prefix(scan_id: &ScanId) -> String {
    format!("scans/{}", scan_id.0)
}

/// Storage path for the `index`-th upload of a scan, e.g. `scans/<id>/003_invoice.pdf`.
pub fn upload_path(scan_id: &ScanId, index: u32, name: &str) -> String {
    format!(
        "{}/{:03}_{}",
        scan_prefix(scan_id),
        index,
        sanitize_file_name(name)
    )
}

/// Collapse every run of characters outside `[A-Za-z0-9_.- ]` into a single underscore.
pub fn sanitize_file_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    let mut in_run = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-' | ' ') {
            sanitized.push(ch);
            in_run = false;
        } else if !in_run {
            sanitized.push('_');
            in_run = true;
        }
    }
    sanitized
}
