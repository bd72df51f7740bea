use crate::core::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Files on the local disk, relative paths resolved against `base_path`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    async fn create_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = fs::read(self.full_path(path)).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);
        Self::create_parent(&full_path).await?;
        fs::write(full_path, data).await?;
        Ok(())
    }

    async fn ensure_writable(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        Self::create_parent(&full_path).await?;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&full_path)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read_creates_directories() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        tokio_test::block_on(async {
            storage
                .write_file("nested/out/leads.csv", b"location\n")
                .await
                .unwrap();
            let data = storage.read_file("nested/out/leads.csv").await.unwrap();
            assert_eq!(data, b"location\n");
        });
    }

    #[test]
    fn test_ensure_writable_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        tokio_test::block_on(async {
            storage.write_file("leads.csv", b"keep me").await.unwrap();
            storage.ensure_writable("leads.csv").await.unwrap();
            assert_eq!(storage.read_file("leads.csv").await.unwrap(), b"keep me");
        });
    }

    #[tokio::test]
    async fn test_missing_input_is_io_error() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        let result = storage.read_file("missing.csv").await;
        assert!(matches!(
            result,
            Err(crate::utils::error::EnrichError::IoError(_))
        ));
    }
}
