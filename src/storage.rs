//! Local media storage for uploaded documents and images.
//!
//! Files are written below the configured media root and referenced from
//! the database by their path relative to that root, e.g.
//! `road_worthiness/3f2c..._certificate.pdf`. The same relative path is
//! served under `/media`.

use std::future::Future;
use std::path::{Path, PathBuf};

use sea_orm::DbErr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const MEDIA_URL_PREFIX: &str = "/media";

#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `bytes` under `dir` and return the relative path.
    pub async fn save(&self, dir: &str, original_name: &str, bytes: &[u8]) -> AppResult<String> {
        let relative = format!("{}/{}_{}", dir, Uuid::new_v4().simple(), sanitize(original_name));
        let target = self.root.join(&relative);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create media dir: {}", e)))?;
        }

        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write upload: {}", e)))?;

        tracing::debug!(path = %relative, size = bytes.len(), "Stored upload");
        Ok(relative)
    }

    /// Best effort; a missing file is not an error.
    pub async fn remove(&self, relative: &str) {
        if relative.is_empty() {
            return;
        }
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => tracing::debug!(path = %relative, "Removed upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %relative, error = %e, "Failed to remove upload"),
        }
    }

    /// Await the row write that references a freshly saved file. The file is
    /// removed again when the write fails.
    pub async fn commit<T>(
        &self,
        relative: &str,
        write: impl Future<Output = Result<T, DbErr>>,
    ) -> AppResult<T> {
        match write.await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.remove(relative).await;
                Err(e.into())
            }
        }
    }

    pub fn url(&self, relative: &str) -> String {
        format!("{}/{}", MEDIA_URL_PREFIX, relative)
    }
}

/// Keep the final path component, restricted to `[A-Za-z0-9._-]`.
fn sanitize(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.chars().take(100).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_odd_chars() {
        assert_eq!(sanitize("../../etc/passwd"), "passwd");
        assert_eq!(sanitize("C:\\docs\\my file.pdf"), "my_file.pdf");
        assert_eq!(sanitize(".hidden"), "hidden");
        assert_eq!(sanitize(""), "upload");
    }

    #[tokio::test]
    async fn save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let relative = store
            .save("road_worthiness", "road.pdf", b"content")
            .await
            .unwrap();
        assert!(relative.starts_with("road_worthiness/"));
        assert!(relative.ends_with("_road.pdf"));

        let on_disk = tokio::fs::read(dir.path().join(&relative)).await.unwrap();
        assert_eq!(on_disk, b"content");
        assert_eq!(store.url(&relative), format!("/media/{}", relative));

        store.remove(&relative).await;
        assert!(!dir.path().join(&relative).exists());
        // second removal is a no-op
        store.remove(&relative).await;
    }

    #[tokio::test]
    async fn failed_write_drops_the_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let relative = store.save("company/logos", "l.png", b"png").await.unwrap();
        let err = store
            .commit(&relative, async { Err::<(), _>(DbErr::RecordNotUpdated) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(DbErr::RecordNotUpdated)));
        assert!(!dir.path().join(&relative).exists());

        let kept = store.save("company/logos", "l.png", b"png").await.unwrap();
        let value = store.commit(&kept, async { Ok::<_, DbErr>(7) }).await.unwrap();
        assert_eq!(value, 7);
        assert!(dir.path().join(&kept).exists());
    }
}
