//! File storage - Salvataggio degli upload
//!
//! Gli handler conoscono solo il trait `FileStorage`; l'implementazione di
//! default scrive su disco in `UPLOAD_DIR` e i file vengono serviti da
//! `/uploads` tramite `ServeDir`.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Content type ammessi e relativa estensione
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("application/pdf", "pdf"),
];

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(ct, _)| ct.eq_ignore_ascii_case(content_type))
        .map(|(_, ext)| *ext)
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Salva il file con il nome dato e restituisce l'URL pubblico
    async fn store(&self, file_name: &str, data: &[u8]) -> std::io::Result<String>;
}

pub struct LocalStorage {
    dir: PathBuf,
    public_prefix: String,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn store(&self, file_name: &str, data: &[u8]) -> std::io::Result<String> {
        // il nome è generato dal server, ma non deve comunque uscire dalla cartella
        if file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "invalid file name",
            ));
        }

        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        debug!("Writing upload to {}", path.display());

        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        info!("Stored upload {} ({} bytes)", file_name, data.len());
        Ok(format!("{}/{}", self.public_prefix, file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("IMAGE/JPEG"), Some("jpg"));
        assert_eq!(extension_for("application/x-msdownload"), None);
    }

    #[tokio::test]
    async fn local_storage_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:3000/uploads/");

        let url = storage.store("abc.png", b"\x89PNG").await.unwrap();
        assert_eq!(url, "http://localhost:3000/uploads/abc.png");

        let written = tokio::fs::read(dir.path().join("abc.png")).await.unwrap();
        assert_eq!(written, b"\x89PNG");
    }

    #[tokio::test]
    async fn local_storage_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "/uploads");
        assert!(storage.store("../evil.png", b"x").await.is_err());
    }
}
