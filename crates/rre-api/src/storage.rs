use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// On-disk storage for wall media. Files land under
/// `{root}/{image|document}/` with a collision-resistant generated name;
/// the returned URL is what the post references and what the static
/// `/uploads` route serves.
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub async fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(root.join("image")).await?;
        fs::create_dir_all(root.join("document")).await?;
        info!("Media storage directory: {}", root.display());
        Ok(Self { root })
    }

    /// Write one file and return its public URL. The stored name keeps the
    /// original extension but nothing else of the client-supplied name.
    pub async fn save(&self, kind: &str, original_name: &str, data: &[u8]) -> Result<String> {
        let stored_name = generated_name(original_name);
        let path = self.root.join(kind).join(&stored_name);
        fs::write(&path, data).await?;
        Ok(format!("/uploads/{kind}/{stored_name}"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn generated_name(original_name: &str) -> String {
    let token = Uuid::new_v4().simple();
    let millis = Utc::now().timestamp_millis();
    match Path::new(original_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{millis}_{token}.{ext}"),
        None => format!("{millis}_{token}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_name_keeps_extension_only() {
        let name = generated_name("../../../etc/passwd.png");
        assert!(name.ends_with(".png"));
        assert!(!name.contains('/'));
        assert!(!name.contains("passwd"));
    }

    #[test]
    fn generated_names_differ() {
        assert_ne!(generated_name("a.pdf"), generated_name("a.pdf"));
    }

    #[tokio::test]
    async fn save_writes_under_kind_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().to_path_buf()).await.unwrap();

        let url = store.save("image", "photo.png", b"bytes").await.unwrap();
        assert!(url.starts_with("/uploads/image/"));

        let stored = url.strip_prefix("/uploads/").unwrap();
        let on_disk = std::fs::read(dir.path().join(stored)).unwrap();
        assert_eq!(on_disk, b"bytes");
    }
}
