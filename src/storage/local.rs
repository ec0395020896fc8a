use crate::storage::{BlobStore, StorageError};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Filesystem implementation for local development.
///
/// Content is written to a temporary sibling and hard-linked into place, so
/// the final file is complete when it appears and an existing file is never
/// replaced.
#[derive(Debug)]
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn path_for_key(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        if key.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidPath(key.to_string()));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put_new(
        &self,
        path: &str,
        content: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let target = self.path_for_key(path)?;
        let parent = target
            .parent()
            .ok_or_else(|| StorageError::InvalidPath(path.to_string()))?;
        tokio::fs::create_dir_all(parent).await?;

        let staging = parent.join(format!(".{}.partial", uuid::Uuid::new_v4()));
        tokio::fs::write(&staging, &content).await?;

        let linked = tokio::fs::hard_link(&staging, &target).await;
        if let Err(e) = tokio::fs::remove_file(&staging).await {
            warn!("Could not remove staging file {}: {}", staging.display(), e);
        }
        match linked {
            Ok(()) => Ok(format!("file://{}", target.display())),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_new_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        let uri = store
            .put_new("dev/id/GameATron4000.Development.bot", b"{\"a\":1}".to_vec(), "application/json")
            .await
            .unwrap();

        let expected = dir.path().join("dev/id/GameATron4000.Development.bot");
        assert_eq!(uri, format!("file://{}", expected.display()));
        assert_eq!(std::fs::read(&expected).unwrap(), b"{\"a\":1}");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("dev/id"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_put_new_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        store.put_new("dev/x.bot", b"first".to_vec(), "application/json").await.unwrap();
        let err = store
            .put_new("dev/x.bot", b"second".to_vec(), "application/json")
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(std::fs::read(dir.path().join("dev/x.bot")).unwrap(), b"first");

        let names: Vec<_> = std::fs::read_dir(dir.path().join("dev"))
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["x.bot".to_string()]);
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        for key in ["../x.bot", "/etc/x.bot", "dev/../../x.bot", ""] {
            let err = store.put_new(key, Vec::new(), "application/json").await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidPath(_)), "{key}");
        }
    }
}
