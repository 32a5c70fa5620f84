use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Uploaded bytes land under a deterministic
/// `departments/{dept}/{category}/{semester}/{year}/{stored_name}` key so
/// out-of-band backup and audit tooling can walk the tree.
#[async_trait]
pub trait FileStorage: Send + Sync + 'static {
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;

    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    async fn remove(&self, key: &str) -> Result<()>;
}

pub struct LocalStorage {
    root: PathBuf,
}

const WRITE_CHUNK_BYTES: usize = 64 * 1024;

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            bail!("storage key '{key}' contains invalid path components");
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create storage directory for {key}"))?;
        }

        let mut file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("failed to create storage file for {key}"))?;
        for chunk in bytes.chunks(WRITE_CHUNK_BYTES) {
            file.write_all(chunk)
                .await
                .with_context(|| format!("failed to write storage file for {key}"))?;
        }
        file.flush()
            .await
            .with_context(|| format!("failed to flush storage file for {key}"))?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read storage file for {key}"))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("failed to remove storage file for {key}"))
    }
}
