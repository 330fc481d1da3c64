use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::domain::{EvaluationResult, FileDescriptor, ScanId, ScanStatus};
use super::evaluation::{EvaluationEngine, EvaluationError};
use super::intake::{scan_prefix, upload_path, UploadRequest, UploadSlot};
use super::report::SummaryReport;
use super::repository::{RepositoryError, ScanRecord, ScanRepository};
use super::storage::{ObjectStore, StorageError};
use crate::config::ScanConfig;

/// Settings the service needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub public_base_url: String,
    pub result_token_ttl: Duration,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:3000".to_string(),
            result_token_ttl: Duration::days(7),
        }
    }
}

impl From<&ScanConfig> for ScanSettings {
    fn from(config: &ScanConfig) -> Self {
        Self {
            public_base_url: config.public_base_url.clone(),
            result_token_ttl: Duration::days(i64::from(config.result_token_ttl_days)),
        }
    }
}

/// Identifiers handed back when a scan is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanTicket {
    pub scan_id: ScanId,
    pub public_token: String,
}

/// Response to a finalized scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionView {
    pub public_url: String,
    pub score: u8,
    pub status: ScanStatus,
}

/// Service wiring storage and persistence around the evaluation engine.
pub struct ScanService<R, S> {
    repository: Arc<R>,
    store: Arc<S>,
    engine: Arc<EvaluationEngine>,
    settings: ScanSettings,
}

impl<R, S> ScanService<R, S>
where
    R: ScanRepository + 'static,
    S: ObjectStore + 'static,
{
    pub fn new(
        repository: Arc<R>,
        store: Arc<S>,
        engine: EvaluationEngine,
        settings: ScanSettings,
    ) -> Self {
        Self {
            repository,
            store,
            engine: Arc::new(engine),
            settings,
        }
    }

    /// Open a new scan with a fresh public token.
    pub fn create_scan(&self, now: DateTime<Utc>) -> Result<ScanTicket, ScanServiceError> {
        let id = ScanId(Uuid::new_v4().to_string());
        let token = Uuid::new_v4().simple().to_string();
        let expires_at = now
            .checked_add_signed(self.settings.result_token_ttl)
            .ok_or(ScanServiceError::TokenLifetime)?;
        let record = ScanRecord::new(id, token, expires_at);

        let stored = self.repository.insert(record)?;
        info!(scan_id = %stored.id, "scan opened");

        Ok(ScanTicket {
            scan_id: stored.id,
            public_token: stored.public_token,
        })
    }

    /// Issue one signed upload slot per requested file.
    pub fn sign_uploads(
        &self,
        scan_id: &ScanId,
        requests: &[UploadRequest],
    ) -> Result<Vec<UploadSlot>, ScanServiceError> {
        if scan_id.0.trim().is_empty() {
            return Err(ScanServiceError::InvalidRequest(
                "scanId required".to_string(),
            ));
        }

        requests
            .iter()
            .map(|request| -> Result<UploadSlot, ScanServiceError> {
                let path = upload_path(scan_id, request.index, &request.name);
                let signed = self.store.create_signed_upload(&path)?;
                Ok(UploadSlot {
                    index: request.index,
                    path: signed.path,
                    token: signed.token,
                })
            })
            .collect()
    }

    /// Evaluate everything uploaded under the scan and persist the outcome.
    pub fn complete(
        &self,
        scan_id: &ScanId,
        contact: Option<Value>,
        utm: Option<Value>,
    ) -> Result<CompletionView, ScanServiceError> {
        let mut record = self
            .repository
            .fetch(scan_id)?
            .ok_or(RepositoryError::NotFound)?;

        let prefix = scan_prefix(scan_id);
        let files: Vec<FileDescriptor> = self
            .store
            .list(&prefix)?
            .into_iter()
            .map(|object| FileDescriptor {
                path: format!("{prefix}/{}", object.name),
                name: object.name,
                mime: object.mime.unwrap_or_default(),
                size: object.size.unwrap_or(0),
            })
            .collect();

        record.upsert_files(&files);
        let result = self.engine.evaluate(&files, self.store.as_ref())?;

        record.contact = contact;
        record.utm = utm;
        record.evaluation = Some(result.clone());
        let public_url = format!(
            "{}/result/{}?token={}",
            self.settings.public_base_url.trim_end_matches('/'),
            record.id,
            record.public_token
        );
        self.repository.update(record)?;

        info!(
            scan_id = %scan_id,
            files = files.len(),
            score = result.score,
            status = %result.status,
            "scan completed"
        );

        Ok(CompletionView {
            public_url,
            score: result.score,
            status: result.status,
        })
    }

    /// Token-gated retrieval of the latest evaluation.
    pub fn result(
        &self,
        scan_id: &ScanId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<EvaluationResult, ScanServiceError> {
        let record = self.authorized(scan_id, token, now)?;
        Ok(record.result_view())
    }

    pub fn summary(
        &self,
        scan_id: &ScanId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SummaryReport, ScanServiceError> {
        let record = self.authorized(scan_id, token, now)?;
        Ok(SummaryReport::new(record.id.clone(), record.result_view()))
    }

    fn authorized(
        &self,
        scan_id: &ScanId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ScanRecord, ScanServiceError> {
        let record = self
            .repository
            .fetch(scan_id)?
            .ok_or(RepositoryError::NotFound)?;

        if record.public_token.is_empty() || record.public_token != token {
            return Err(AccessError::Unauthorized.into());
        }
        if record
            .token_expires_at
            .is_some_and(|expires_at| expires_at < now)
        {
            return Err(AccessError::Expired.into());
        }

        Ok(record)
    }
}

/// Rejections for token-gated result access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Expired")]
    Expired,
}

/// Error raised by the scan service.
#[derive(Debug, thiserror::Error)]
pub enum ScanServiceError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error("result token lifetime overflows the expiry timestamp")]
    TokenLifetime,
}
