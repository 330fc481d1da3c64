use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{EvaluationResult, FileDescriptor, ScanId};

/// Persisted scan row with its access token and latest evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: ScanId,
    pub public_token: String,
    pub token_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contact: Option<Value>,
    #[serde(default)]
    pub utm: Option<Value>,
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
    #[serde(default)]
    pub evaluation: Option<EvaluationResult>,
}

impl ScanRecord {
    pub fn new(id: ScanId, public_token: String, token_expires_at: DateTime<Utc>) -> Self {
        Self {
            id,
            public_token,
            token_expires_at: Some(token_expires_at),
            contact: None,
            utm: None,
            files: Vec::new(),
            evaluation: None,
        }
    }

    /// Insert or replace file rows keyed by storage path.
    pub fn upsert_files(&mut self, files: &[FileDescriptor]) {
        for file in files {
            match self.files.iter_mut().find(|existing| existing.path == file.path) {
                Some(existing) => *existing = file.clone(),
                None => self.files.push(file.clone()),
            }
        }
    }

    pub fn result_view(&self) -> EvaluationResult {
        self.evaluation
            .clone()
            .unwrap_or_else(EvaluationResult::unevaluated)
    }
}

/// Storage abstraction for scan rows so the service can be exercised in isolation.
pub trait ScanRepository: Send + Sync {
    fn insert(&self, record: ScanRecord) -> Result<ScanRecord, RepositoryError>;
    fn update(&self, record: ScanRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ScanId) -> Result<Option<ScanRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
