use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for a claim-packet scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScanId(pub String);

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One uploaded artifact belonging to a scan, as reported by the storage listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub mime: String,
    #[serde(default)]
    pub size: u64,
}

impl FileDescriptor {
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        mime: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            mime: mime.into(),
            size,
        }
    }
}

/// Completeness requirements checked for every packet, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Photos,
    #[serde(rename = "Moisture Logs")]
    MoistureLogs,
    #[serde(rename = "RH/Temp")]
    RhTemp,
    Psychrometrics,
    Signatures,
    Equipment,
    Invoice,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Photos,
        Category::MoistureLogs,
        Category::RhTemp,
        Category::Psychrometrics,
        Category::Signatures,
        Category::Equipment,
        Category::Invoice,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Category::Photos => "Photos",
            Category::MoistureLogs => "Moisture Logs",
            Category::RhTemp => "RH/Temp",
            Category::Psychrometrics => "Psychrometrics",
            Category::Signatures => "Signatures",
            Category::Equipment => "Equipment",
            Category::Invoice => "Invoice",
        }
    }

    /// Remediation sentence surfaced to the uploader when the category fails.
    pub const fn default_details(self) -> &'static str {
        match self {
            Category::Photos => "Provide ≥10 photos or ≥4 photo pages.",
            Category::MoistureLogs => "Include daily material moisture logs.",
            Category::RhTemp => "Add daily ambient RH & temperature for 3 consecutive days.",
            Category::Psychrometrics => "Attach a psychrometrics (GPP/dew point) sheet.",
            Category::Signatures => "Add signed work authorization & completion certificate.",
            Category::Equipment => "List dehumidifiers/air movers with serials.",
            Category::Invoice => "Provide exactly one invoice PDF with totals/date.",
        }
    }

    pub const fn default_weight(self) -> u8 {
        match self {
            Category::Photos | Category::MoistureLogs | Category::RhTemp => 20,
            Category::Psychrometrics => 15,
            Category::Signatures | Category::Equipment => 10,
            Category::Invoice => 5,
        }
    }

    /// Critical categories force the red tier on failure; the rest only degrade to amber.
    pub const fn default_critical(self) -> bool {
        !matches!(self, Category::Psychrometrics | Category::Equipment)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Summary tier derived from which categories failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Green,
    Amber,
    Red,
}

impl ScanStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ScanStatus::Green => "green",
            ScanStatus::Amber => "amber",
            ScanStatus::Red => "red",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pass/fail outcome for one category. `details` is empty when the category passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub name: Category,
    pub pass: bool,
    pub details: String,
}

/// Complete evaluation of a packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: u8,
    pub status: ScanStatus,
    pub sections: Vec<CategoryResult>,
    pub fixes: Vec<String>,
}

impl EvaluationResult {
    /// Placeholder exposed for scans that were created but never completed.
    pub fn unevaluated() -> Self {
        Self {
            score: 0,
            status: ScanStatus::Red,
            sections: Vec::new(),
            fixes: Vec::new(),
        }
    }

    pub fn failing(&self) -> impl Iterator<Item = &CategoryResult> {
        self.sections.iter().filter(|section| !section.pass)
    }
}
