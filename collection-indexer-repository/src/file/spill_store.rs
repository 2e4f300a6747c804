//! Spill directory holding unacknowledged bulk payloads.

use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::interfaces::SpillStore;

/// Extension of spilled payload files.
const SPILL_EXTENSION: &str = "dat";

/// Writes each payload to its own `<timestamp>_<seq>_<uuid>.dat` file.
///
/// File names sort in write order, which is the order `drain` returns them in.
pub struct FileSpillStore {
    directory: PathBuf,
    sequence: AtomicU64,
}

impl FileSpillStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            sequence: AtomicU64::new(0),
        }
    }

    fn next_file_name(&self) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}_{:012}_{}.{}",
            Utc::now().format("%Y%m%d%H%M%S%6f"),
            sequence,
            Uuid::new_v4().simple(),
            SPILL_EXTENSION
        )
    }
}

#[async_trait]
impl SpillStore for FileSpillStore {
    async fn store(&self, payloads: &[String]) -> Result<(), RepositoryError> {
        if payloads.is_empty() {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| RepositoryError::io(format!("{}: {}", self.directory.display(), e)))?;

        for payload in payloads {
            let path = self.directory.join(self.next_file_name());
            tokio::fs::write(&path, payload)
                .await
                .map_err(|e| RepositoryError::io(format!("{}: {}", path.display(), e)))?;
        }

        info!(
            count = payloads.len(),
            directory = %self.directory.display(),
            "Spilled pending payloads"
        );
        Ok(())
    }

    async fn drain(&self) -> Result<Vec<String>, RepositoryError> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(RepositoryError::io(format!("{}: {}", self.directory.display(), e)))
            }
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RepositoryError::io(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == SPILL_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut payloads = Vec::with_capacity(paths.len());
        for path in paths {
            let payload = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| RepositoryError::io(format!("{}: {}", path.display(), e)))?;
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove drained spill file");
            }
            payloads.push(payload);
        }

        if !payloads.is_empty() {
            info!(count = payloads.len(), "Drained spilled payloads");
        }
        Ok(payloads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_then_drain_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSpillStore::new(dir.path().join("spill"));

        store.store(&["first\n".to_string(), "second\n".to_string()]).await.unwrap();
        store.store(&["third\n".to_string()]).await.unwrap();

        let drained = store.drain().await.unwrap();
        assert_eq!(drained, vec!["first\n", "second\n", "third\n"]);

        assert!(store.drain().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_names_carry_timestamp_sequence_and_uuid() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSpillStore::new(dir.path());
        store.store(&["a".to_string(), "b".to_string()]).await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);

        for (expected_sequence, name) in names.iter().enumerate() {
            let stem = name.strip_suffix(".dat").unwrap();
            let parts: Vec<&str> = stem.split('_').collect();
            assert_eq!(parts.len(), 3, "{}", name);
            assert_eq!(parts[0].len(), 20);
            assert_eq!(parts[1], format!("{:012}", expected_sequence));
            assert_eq!(parts[2].len(), 32);
        }
    }

    #[tokio::test]
    async fn test_drain_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSpillStore::new(dir.path().join("absent"));
        assert!(store.drain().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        let store = FileSpillStore::new(dir.path());
        store.store(&["payload".to_string()]).await.unwrap();

        assert_eq!(store.drain().await.unwrap(), vec!["payload"]);
        assert!(dir.path().join("notes.txt").exists());
    }
}
