mod config;
mod policy;
mod rules;

pub use config::{CategoryPolicy, CategoryRule, RuleTable, RuleTableError};
pub use rules::{classify, contains_any, FileSets, PacketEvidence, Predicate};

use std::collections::HashSet;

use tracing::debug;

use super::domain::{EvaluationResult, FileDescriptor};
use super::pages::PageCounter;
use super::storage::ObjectStore;

/// Stateless evaluator that applies the rule table to a packet's file list.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    rules: Vec<CategoryRule>,
}

impl Default for EvaluationEngine {
    fn default() -> Self {
        Self::new(RuleTable::default())
    }
}

impl EvaluationEngine {
    pub fn new(table: RuleTable) -> Self {
        Self {
            rules: table.rules(),
        }
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Evaluate a packet, fetching PDF bytes from `store` to count pages.
    pub fn evaluate<S>(
        &self,
        files: &[FileDescriptor],
        store: &S,
    ) -> Result<EvaluationResult, EvaluationError>
    where
        S: ObjectStore + ?Sized,
    {
        validate(files)?;

        let sets = classify(files);
        let pdf_paths: Vec<&str> = sets.pdfs.iter().map(|file| file.path.as_str()).collect();
        let max_pdf_pages = PageCounter::new(store).max_page_count(&pdf_paths);

        Ok(self.aggregate(files, sets, max_pdf_pages))
    }

    /// Evaluate with an already known maximum PDF page count; performs no I/O.
    pub fn evaluate_with_page_count(
        &self,
        files: &[FileDescriptor],
        max_pdf_pages: u32,
    ) -> Result<EvaluationResult, EvaluationError> {
        validate(files)?;
        Ok(self.aggregate(files, classify(files), max_pdf_pages))
    }

    fn aggregate<'a>(
        &self,
        files: &'a [FileDescriptor],
        sets: FileSets<'a>,
        max_pdf_pages: u32,
    ) -> EvaluationResult {
        let evidence = PacketEvidence::new(files, sets, max_pdf_pages);
        let result = policy::aggregate(&self.rules, &evidence);

        debug!(
            files = files.len(),
            images = evidence.images.len(),
            pdfs = evidence.pdfs.len(),
            max_pdf_pages,
            score = result.score,
            status = %result.status,
            "packet evaluated"
        );

        result
    }
}

fn validate(files: &[FileDescriptor]) -> Result<(), EvaluationError> {
    let mut seen = HashSet::with_capacity(files.len());
    for file in files {
        if file.path.trim().is_empty() {
            return Err(EvaluationError::InvalidInput(format!(
                "file '{}' has an empty storage path",
                file.name
            )));
        }
        if !seen.insert(file.path.as_str()) {
            return Err(EvaluationError::InvalidInput(format!(
                "storage path '{}' appears more than once",
                file.path
            )));
        }
    }
    Ok(())
}

/// Raised when the file list handed to the engine is malformed.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("invalid packet: {0}")]
    InvalidInput(String),
}
