// src/store.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;

/// Durable destination for finished artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, name: &str, content: &[u8]) -> Result<(), PersistenceError>;
}

/// `<kind>-<YYYY-MM-DD>.json`
pub fn artifact_name(kind: &str, date: NaiveDate) -> String {
    format!("{}-{}.json", kind, date.format("%Y-%m-%d"))
}

/// Writes artifacts into a local directory. Each write goes to a temp file
/// first and is renamed into place, so readers never see a partial file.
#[derive(Debug, Clone)]
pub struct LocalDirStore {
    dir: PathBuf,
}

impl LocalDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArtifactStore for LocalDirStore {
    async fn put(&self, name: &str, content: &[u8]) -> Result<(), PersistenceError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(PersistenceError::new(name, "invalid artifact name"));
        }
        let fail = |e: std::io::Error| PersistenceError::new(name, e.to_string());

        tokio::fs::create_dir_all(&self.dir).await.map_err(fail)?;
        let tmp = self.dir.join(format!(".{name}.tmp"));
        let dst = self.dir.join(name);
        if let Err(e) = tokio::fs::write(&tmp, content).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(fail(e));
        }
        tokio::fs::rename(&tmp, &dst).await.map_err(fail)?;
        tracing::debug!(target: "monitor", path = %dst.display(), bytes = content.len(), "artifact stored");
        Ok(())
    }
}

// --- Test helper ---
#[derive(Default)]
pub struct MemoryStore {
    pub items: std::sync::Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<String> {
        self.items
            .lock()
            .map(|v| v.iter().map(|(n, _)| n.clone()).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.items
            .lock()
            .ok()?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.clone())
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn put(&self, name: &str, content: &[u8]) -> Result<(), PersistenceError> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| PersistenceError::new(name, "memory store poisoned"))?;
        items.push((name.to_string(), content.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_kind_and_date() {
        let d = NaiveDate::from_ymd_opt(2025, 9, 6).unwrap();
        assert_eq!(artifact_name("analytics-report", d), "analytics-report-2025-09-06.json");
    }

    #[tokio::test]
    async fn local_store_writes_whole_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalDirStore::new(tmp.path().join("reports"));
        store.put("a.json", b"{\"ok\":true}").await.unwrap();

        let written = std::fs::read_to_string(tmp.path().join("reports/a.json")).unwrap();
        assert_eq!(written, "{\"ok\":true}");
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path().join("reports"))
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn local_store_rejects_path_names() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalDirStore::new(tmp.path());
        let err = store.put("../escape.json", b"x").await.unwrap_err();
        assert_eq!(err.name, "../escape.json");
    }

    #[tokio::test]
    async fn local_store_surfaces_io_errors() {
        let tmp = tempfile::tempdir().unwrap();
        // A regular file where the directory should be.
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let store = LocalDirStore::new(&blocker);
        assert!(store.put("r.json", b"{}").await.is_err());
    }

    #[tokio::test]
    async fn memory_store_records_puts() {
        let s = MemoryStore::new();
        s.put("r.json", b"{}").await.unwrap();
        assert_eq!(s.names(), vec!["r.json".to_string()]);
        assert_eq!(s.get("r.json").unwrap(), b"{}".to_vec());
    }
}
