//! File storage.
//!
//! Object store backed by a directory on disk. Stored names are
//! prefixed with a random id so uploads never collide; public urls
//! are served under /files/.

use super::*;

use studyfeed::StoreError;

/// Filesystem blob store.
pub struct FsBlobs {
    /// Directory holding the blobs.
    root: PathBuf,
}

impl FsBlobs {
    /// Create a blob store rooted at a directory.
    pub fn new(root: impl AsRef<str>) -> Result<Self> {
        let root: PathBuf = PathBuf::from(root.as_ref()).resolve().into_owned();
        if let Err(e) = std::fs::create_dir_all(&root) {
            bail!("Unable to create files directory {:?}: {}", root, e);
        }
        tracing::debug!("Using files directory: {:?}", &root);
        Ok(Self { root })
    }

    /// Strip an uploaded name down to a safe file name component.
    fn sanitize(name: &str) -> String {
        let name = match name.rsplit(['/', '\\']).next() {
            Some(base) => base,
            None => name,
        };
        name.chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
                _ => '_',
            })
            .collect()
    }
}

#[studyfeed::backend_trait]
impl studyfeed::BlobStore for FsBlobs {
    async fn store(
        &self,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StoreError> {
        let stored = format!(
            "{}_{}",
            uuid::Uuid::new_v4(),
            FsBlobs::sanitize(name)
        );
        let path = self.root.join(&stored);
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            tracing::error!("Failed to store blob {:?}: {}", path, e);
            return Err(StoreError::Backend(e.to_string()));
        }
        Ok(format!("/files/{}", stored))
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        // Only stored names are valid; anything path-like is rejected.
        if name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(StoreError::NotFound);
        }
        match tokio::fs::read(self.root.join(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound)
            }
            Err(e) => {
                tracing::error!("Failed to read blob {}: {}", name, e);
                Err(StoreError::Backend(e.to_string()))
            }
        }
    }
}
