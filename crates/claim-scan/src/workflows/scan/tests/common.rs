use std::collections::{BTreeMap, HashMap};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use lopdf::{dictionary, Document, Object};
use serde_json::Value;

use crate::workflows::scan::domain::{FileDescriptor, ScanId};
use crate::workflows::scan::evaluation::EvaluationEngine;
use crate::workflows::scan::repository::{RepositoryError, ScanRecord, ScanRepository};
use crate::workflows::scan::service::{ScanService, ScanSettings};
use crate::workflows::scan::storage::{ObjectStore, SignedUpload, StorageError, StoredObject};

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<ScanId, ScanRecord>>,
}

impl MemoryRepository {
    pub(super) fn get(&self, id: &ScanId) -> Option<ScanRecord> {
        self.records.lock().expect("repo mutex").get(id).cloned()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.records.lock().expect("repo mutex").is_empty()
    }
}

impl ScanRepository for MemoryRepository {
    fn insert(&self, record: ScanRecord) -> Result<ScanRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repo mutex");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ScanRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repo mutex");
        if !guard.contains_key(&record.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &ScanId) -> Result<Option<ScanRecord>, RepositoryError> {
        Ok(self.records.lock().expect("repo mutex").get(id).cloned())
    }
}

#[derive(Clone)]
struct StoredBlob {
    mime: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
pub(super) struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredBlob>>,
    fetches: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub(super) fn put(&self, path: &str, mime: &str, bytes: Vec<u8>) {
        self.objects.lock().expect("store mutex").insert(
            path.to_string(),
            StoredBlob {
                mime: mime.to_string(),
                bytes,
            },
        );
    }

    pub(super) fn fetch_count(&self) -> usize {
        self.fetches.lock().expect("fetch mutex").len()
    }
}

impl ObjectStore for MemoryStore {
    fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError> {
        let folder = format!("{prefix}/");
        let guard = self.objects.lock().expect("store mutex");
        Ok(guard
            .iter()
            .filter_map(|(path, blob)| {
                path.strip_prefix(&folder).map(|name| StoredObject {
                    name: name.to_string(),
                    mime: Some(blob.mime.clone()),
                    size: Some(blob.bytes.len() as u64),
                })
            })
            .collect())
    }

    fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.fetches
            .lock()
            .expect("fetch mutex")
            .push(path.to_string());
        self.objects
            .lock()
            .expect("store mutex")
            .get(path)
            .map(|blob| blob.bytes.clone())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn create_signed_upload(&self, path: &str) -> Result<SignedUpload, StorageError> {
        Ok(SignedUpload {
            path: path.to_string(),
            token: format!("signed:{path}"),
        })
    }
}

pub(super) struct UnavailableStore;

impl ObjectStore for UnavailableStore {
    fn list(&self, _prefix: &str) -> Result<Vec<StoredObject>, StorageError> {
        Err(StorageError::Backend("bucket offline".to_string()))
    }

    fn fetch_bytes(&self, _path: &str) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::Backend("bucket offline".to_string()))
    }

    fn create_signed_upload(&self, _path: &str) -> Result<SignedUpload, StorageError> {
        Err(StorageError::Backend("bucket offline".to_string()))
    }
}

/// Store whose listing parks until the test opens the gate.
pub(super) struct GatedStore {
    entered: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl GatedStore {
    pub(super) fn new() -> (Self, tokio::sync::oneshot::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let store = Self {
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(release_rx),
        };
        (store, entered_rx, release_tx)
    }
}

impl ObjectStore for GatedStore {
    fn list(&self, _prefix: &str) -> Result<Vec<StoredObject>, StorageError> {
        if let Some(entered) = self.entered.lock().expect("gate mutex").take() {
            let _ = entered.send(());
        }
        self.release
            .lock()
            .expect("gate mutex")
            .recv_timeout(Duration::from_secs(2))
            .map(|()| Vec::new())
            .map_err(|_| StorageError::Backend("listing never released".to_string()))
    }

    fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::NotFound(path.to_string()))
    }

    fn create_signed_upload(&self, path: &str) -> Result<SignedUpload, StorageError> {
        Ok(SignedUpload {
            path: path.to_string(),
            token: format!("signed:{path}"),
        })
    }
}

/// Minimal valid PDF with `pages` blank letter-size pages.
pub(super) fn pdf_bytes(pages: u32) -> Vec<u8> {
    save(pdf_document(pages))
}

/// Same page tree as `pdf_bytes`, with a Standard security handler in the trailer.
pub(super) fn encrypted_pdf_bytes(pages: u32) -> Vec<u8> {
    let mut doc = pdf_document(pages);
    doc.trailer.set(
        "Encrypt",
        dictionary! {
            "Filter" => "Standard",
            "V" => 1,
            "R" => 2,
            "O" => Object::string_literal(vec![0x4Fu8; 32]),
            "U" => Object::string_literal(vec![0x55u8; 32]),
            "P" => -44,
        },
    );
    doc.trailer.set(
        "ID",
        vec![
            Object::string_literal(b"claim-scan-fixture".to_vec()),
            Object::string_literal(b"claim-scan-fixture".to_vec()),
        ],
    );
    save(doc)
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("pdf serializes");
    bytes
}

fn pdf_document(pages: u32) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
            });
            Object::Reference(page_id)
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::from(pages),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

pub(super) fn file(name: &str, mime: &str) -> FileDescriptor {
    FileDescriptor::new(format!("scans/test/{name}"), name, mime, 1024)
}

pub(super) fn photos(count: usize) -> Vec<FileDescriptor> {
    (1..=count)
        .map(|n| file(&format!("photo_{n:02}.jpg"), "image/jpeg"))
        .collect()
}

/// Packet that satisfies every category with exactly one invoice.
pub(super) fn compliant_packet() -> Vec<FileDescriptor> {
    let mut files = photos(10);
    files.extend([
        file("moisture_readings.pdf", "application/pdf"),
        file("RH temp day 1.pdf", "application/pdf"),
        file("RH temp day 2.pdf", "application/pdf"),
        file("RH temp day 3.pdf", "application/pdf"),
        file("psychrometric chart.pdf", "application/pdf"),
        file("signed work authorization.pdf", "application/pdf"),
        file("dehumidifier serial list.pdf", "application/pdf"),
        file("invoice_2024.pdf", "application/pdf"),
    ]);
    files
}

pub(super) fn without(files: Vec<FileDescriptor>, name: &str) -> Vec<FileDescriptor> {
    files.into_iter().filter(|file| file.name != name).collect()
}

pub(super) fn engine() -> EvaluationEngine {
    EvaluationEngine::default()
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn settings() -> ScanSettings {
    ScanSettings {
        public_base_url: "https://scan.example.com/".to_string(),
        ..ScanSettings::default()
    }
}

pub(super) fn build_service() -> (
    ScanService<MemoryRepository, MemoryStore>,
    Arc<MemoryRepository>,
    Arc<MemoryStore>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let store = Arc::new(MemoryStore::default());
    let service = ScanService::new(repository.clone(), store.clone(), engine(), settings());
    (service, repository, store)
}

/// Upload the compliant packet under the scan's storage prefix.
pub(super) fn upload_compliant_packet(store: &MemoryStore, scan_id: &ScanId) {
    for (index, descriptor) in compliant_packet().iter().enumerate() {
        let path = crate::workflows::scan::intake::upload_path(scan_id, index as u32, &descriptor.name);
        let bytes = if descriptor.mime == "application/pdf" {
            pdf_bytes(1)
        } else {
            vec![0xFF, 0xD8, 0xFF]
        };
        store.put(&path, &descriptor.mime, bytes);
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
