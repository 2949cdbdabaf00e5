use anyhow::Result;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// URL prefix (and path prefix in the history table) for stored uploads.
pub const IMAGES_PREFIX: &str = "images";

/// Longest extension kept, excluding the dot. Keeps `images/<uuid>.<ext>`
/// within the 50 character `image_path` column.
const MAX_EXTENSION_LEN: usize = 6;

/// A file written by [`ImageStore::store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// `<uuid><ext>`, the name on disk.
    pub file_name: String,
    /// `images/<uuid><ext>`, what gets persisted and served.
    pub relative_path: String,
}

/// Manages on-disk storage for uploaded images.
///
/// Each upload is stored as a single flat file at `{dir}/{uuid}{ext}`.
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Write `bytes` under a fresh unique name that keeps the original extension.
    pub async fn store(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<StoredImage> {
        let file_name = format!(
            "{}{}",
            Uuid::new_v4(),
            extension_of(original_name.unwrap_or_default())
        );
        let path = self.dir.join(&file_name);

        // create_new: a name collision must never overwrite an earlier upload
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        Ok(StoredImage {
            relative_path: format!("{}/{}", IMAGES_PREFIX, file_name),
            file_name,
        })
    }

    /// Remove a stored upload. Only used by the compensating cleanup policy.
    pub async fn delete(&self, image: &StoredImage) -> Result<()> {
        let path = self.dir.join(&image.file_name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted orphaned upload {}", image.relative_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Upload {} already gone", image.relative_path);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Extension of the final path component, dot included, or `""`.
///
/// Dotfiles have no extension, and anything that is not 1 to 6 ASCII
/// alphanumerics is dropped.
pub fn extension_of(file_name: &str) -> &str {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);

    match base.rfind('.') {
        Some(dot) if dot > 0 => {
            let ext = &base[dot + 1..];
            let valid = (1..=MAX_EXTENSION_LEN).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric());
            if valid { &base[dot..] } else { "" }
        }
        _ => "",
    }
}
