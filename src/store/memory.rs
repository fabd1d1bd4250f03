//! In-memory storage backend

use std::sync::{Arc, Mutex, MutexGuard};

use super::StorageBackend;
use crate::payload::{ScanLine, StoreRecord};
use crate::{Result, TelemetryError};

#[derive(Debug, Default)]
struct Contents {
    open: bool,
    closed: bool,
    records: Vec<StoreRecord>,
    scan_lines: Vec<ScanLine>,
}

/// Backend that keeps everything in memory.
///
/// Clones share contents, so a caller can hand one clone to the worker and inspect
/// what was stored through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    contents: Arc<Mutex<Contents>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in commit order.
    pub fn records(&self) -> Vec<StoreRecord> {
        self.lock().records.clone()
    }

    /// Scan lines in commit order.
    pub fn scan_lines(&self) -> Vec<ScanLine> {
        self.lock().scan_lines.clone()
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// Opened at some point and closed since.
    pub fn was_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, Contents> {
        self.contents.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_open(&self, operation: &str) -> Result<MutexGuard<'_, Contents>> {
        let contents = self.lock();
        if !contents.open {
            return Err(TelemetryError::storage_failed(format!("{operation} on closed store")));
        }
        Ok(contents)
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryStore {
    async fn open(&mut self) -> Result<()> {
        let mut contents = self.lock();
        contents.open = true;
        contents.closed = false;
        Ok(())
    }

    async fn store(&mut self, record: &StoreRecord) -> Result<()> {
        self.ensure_open("store record")?.records.push(record.clone());
        Ok(())
    }

    async fn store_scan_line(&mut self, line: &ScanLine) -> Result<()> {
        self.ensure_open("store scan line")?.scan_lines.push(line.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut contents = self.lock();
        contents.open = false;
        contents.closed = true;
        Ok(())
    }
}
