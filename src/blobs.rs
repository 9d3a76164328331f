use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{FactdeskError, Result};

/// Durable file storage. Uploads may run on several threads at once.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `path` and return a URL that stays valid.
    fn upload_blob(&self, path: &str, bytes: &[u8]) -> Result<String>;
}

/// Blobs written below a root directory, addressed by `file://` URLs.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl BlobStore for FsBlobStore {
    fn upload_blob(&self, path: &str, bytes: &[u8]) -> Result<String> {
        if path.split('/').any(|part| part == "..") {
            return Err(FactdeskError::Upload(format!("invalid blob path: {path}")));
        }
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, bytes)?;
        let absolute = std::fs::canonicalize(&target).unwrap_or(target);
        Ok(format!("file://{}", absolute.display()))
    }
}

/// Short content digest used to keep uploaded file names unique.
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())[..16].to_string()
}

/// Storage path for an image uploaded by `user_id`.
pub fn image_path(user_id: &str, file_name: &str, bytes: &[u8]) -> String {
    let safe_name: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("images/{user_id}/{}-{safe_name}", content_digest(bytes))
}
