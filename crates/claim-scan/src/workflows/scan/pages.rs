use lopdf::Document;
use tracing::warn;

use super::storage::{ObjectStore, StorageError};

/// Upper bound on concurrent fetches while counting pages.
pub const PAGE_COUNT_BATCH: usize = 8;

/// Parse a PDF byte stream and return the number of pages in its page tree.
///
/// Page dictionaries are not encrypted, so encrypted documents still report a count.
pub fn count_pdf_pages(bytes: &[u8]) -> Result<u32, PageCountError> {
    let document = Document::load_mem(bytes)?;
    Ok(u32::try_from(document.get_pages().len()).unwrap_or(u32::MAX))
}

/// Best-effort page counter backed by an object store.
///
/// Any fetch or parse failure counts as zero pages.
pub struct PageCounter<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ObjectStore + ?Sized> PageCounter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn try_page_count(&self, path: &str) -> Result<u32, PageCountError> {
        let bytes = self.store.fetch_bytes(path)?;
        count_pdf_pages(&bytes)
    }

    pub fn page_count(&self, path: &str) -> u32 {
        self.try_page_count(path).unwrap_or_else(|err| {
            warn!(%path, error = %err, "pdf page count unavailable; counting zero pages");
            0
        })
    }

    /// Fetch paths concurrently, `PAGE_COUNT_BATCH` at a time, and keep the largest page count.
    pub fn max_page_count(&self, paths: &[&str]) -> u32 {
        match paths {
            [] => 0,
            [path] => self.page_count(path),
            _ => paths
                .chunks(PAGE_COUNT_BATCH)
                .map(|batch| self.batch_max(batch))
                .max()
                .unwrap_or(0),
        }
    }

    fn batch_max(&self, batch: &[&str]) -> u32 {
        std::thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|path| scope.spawn(move || self.page_count(path)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(0))
                .max()
                .unwrap_or(0)
        })
    }
}

/// Reasons a page count could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum PageCountError {
    #[error(transparent)]
    Fetch(#[from] StorageError),
    #[error("unable to parse pdf: {0}")]
    Parse(#[from] lopdf::Error),
}
