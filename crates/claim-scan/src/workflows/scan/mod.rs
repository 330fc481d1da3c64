//! Claim-packet intake and completeness evaluation.
//!
//! The evaluation engine is a pure rule evaluator over file names, declared MIME types and
//! PDF page counts. Everything else in this module wires it to object storage, a scan
//! repository and HTTP.

pub mod domain;
pub mod evaluation;
pub mod intake;
pub mod pages;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;

pub use domain::{
    Category, CategoryResult, EvaluationResult, FileDescriptor, ScanId, ScanStatus,
};
pub use evaluation::{
    CategoryPolicy, CategoryRule, EvaluationEngine, EvaluationError, RuleTable, RuleTableError,
};
pub use intake::{sanitize_file_name, upload_path, UploadRequest, UploadSlot};
pub use pages::{count_pdf_pages, PageCountError, PageCounter};
pub use report::SummaryReport;
pub use repository::{RepositoryError, ScanRecord, ScanRepository};
pub use router::scan_router;
pub use service::{
    AccessError, CompletionView, ScanService, ScanServiceError, ScanSettings, ScanTicket,
};
pub use storage::{ObjectStore, SignedUpload, StorageError, StoredObject};
