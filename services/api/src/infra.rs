use claim_scan::config::ScanConfig;
use claim_scan::workflows::scan::{
    EvaluationEngine, ObjectStore, RepositoryError, RuleTable, RuleTableError, ScanId,
    ScanRecord, ScanRepository, SignedUpload, StorageError, StoredObject,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) store: Arc<DirectoryObjectStore>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryScanRepository {
    records: Arc<Mutex<HashMap<ScanId, ScanRecord>>>,
}

impl ScanRepository for InMemoryScanRepository {
    fn insert(&self, record: ScanRecord) -> Result<ScanRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ScanRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ScanId) -> Result<Option<ScanRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

/// Object store backed by a local directory; upload slots are single-use tokens.
pub(crate) struct DirectoryObjectStore {
    root: PathBuf,
    pending: Mutex<HashMap<String, String>>,
}

impl DirectoryObjectStore {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
            .then(|| self.root.join(relative))
    }

    /// Store bytes for a previously signed path, consuming its token.
    pub(crate) fn accept_upload(
        &self,
        path: &str,
        token: &str,
        bytes: &[u8],
    ) -> Result<(), UploadError> {
        let target = self.resolve(path).ok_or(UploadError::InvalidPath)?;
        {
            let mut pending = self.pending.lock().expect("upload mutex poisoned");
            match pending.get(path) {
                Some(expected) if expected == token => {
                    pending.remove(path);
                }
                _ => return Err(UploadError::InvalidToken),
            }
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, bytes)?;
        Ok(())
    }
}

impl ObjectStore for DirectoryObjectStore {
    fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError> {
        let dir = self
            .resolve(prefix)
            .ok_or_else(|| StorageError::NotFound(prefix.to_string()))?;
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StorageError::Backend(err.to_string())),
        };

        let mut objects = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StorageError::Backend(err.to_string()))?;
            let metadata = entry
                .metadata()
                .map_err(|err| StorageError::Backend(err.to_string()))?;
            if !metadata.is_file() {
                continue;
            }
            let path = entry.path();
            objects.push(StoredObject {
                name: entry.file_name().to_string_lossy().into_owned(),
                mime: mime_guess::from_path(&path)
                    .first()
                    .map(|mime| mime.essence_str().to_string()),
                size: Some(metadata.len()),
            });
        }
        objects.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(objects)
    }

    fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let target = self
            .resolve(path)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        std::fs::read(target).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => StorageError::Backend(err.to_string()),
        })
    }

    fn create_signed_upload(&self, path: &str) -> Result<SignedUpload, StorageError> {
        if self.resolve(path).is_none() {
            return Err(StorageError::Backend(format!("refusing to sign path '{path}'")));
        }
        let token = Uuid::new_v4().simple().to_string();
        self.pending
            .lock()
            .expect("upload mutex poisoned")
            .insert(path.to_string(), token.clone());
        Ok(SignedUpload {
            path: path.to_string(),
            token,
        })
    }
}

#[derive(Debug)]
pub(crate) enum UploadError {
    InvalidPath,
    InvalidToken,
    Io(std::io::Error),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::InvalidPath => write!(f, "upload path is not allowed"),
            UploadError::InvalidToken => write!(f, "upload token is missing or invalid"),
            UploadError::Io(err) => write!(f, "unable to store upload: {err}"),
        }
    }
}

impl From<std::io::Error> for UploadError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Rule table from an explicit path, then `CLAIM_SCAN_RULES`, then the built-in defaults.
pub(crate) fn load_rule_table(
    explicit: Option<&Path>,
    config: Option<&ScanConfig>,
) -> Result<RuleTable, RuleTableError> {
    let configured = config.and_then(|scan| scan.rules_path.as_deref());
    match explicit.or(configured) {
        Some(path) => RuleTable::from_path(path),
        None => Ok(RuleTable::default()),
    }
}

pub(crate) fn evaluation_engine(
    explicit: Option<&Path>,
    config: Option<&ScanConfig>,
) -> Result<EvaluationEngine, RuleTableError> {
    load_rule_table(explicit, config).map(EvaluationEngine::new)
}
