use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::storage::StorageClient;

/// Stable reference to an object in the asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub asset_id: String,
    pub url: String,
}

/// Moves spooled upload files into the asset store and removes the spool
/// file on every exit path. A file handed to `upload` is gone from disk
/// afterwards whether the transfer worked or not.
#[derive(Clone)]
pub struct MediaGateway {
    storage: Arc<dyn StorageClient>,
    endpoint: String,
    bucket: String,
    key_prefix: String,
}

impl MediaGateway {
    pub fn new(cfg: &MediaConfig, storage: Arc<dyn StorageClient>) -> Self {
        Self {
            storage,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            bucket: cfg.bucket.clone(),
            key_prefix: cfg.key_prefix.trim_matches('/').to_string(),
        }
    }

    /// Upload a spooled local file. Empty path means no file was given
    /// and nothing is touched. Failures come back as `None`; callers
    /// decide whether a missing asset is an error.
    pub async fn upload(&self, local_path: &str) -> Option<MediaAsset> {
        if local_path.is_empty() {
            return None;
        }

        let bytes = match tokio::fs::read(local_path).await {
            Ok(b) => b,
            Err(e) => {
                warn!(path = %local_path, error = %e, "failed to read spooled upload");
                remove_local_files(std::slice::from_ref(&local_path.to_string())).await;
                return None;
            }
        };

        let ext = Path::new(local_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let key = format!("{}/{}.{}", self.key_prefix, Uuid::new_v4(), ext);

        let result = self
            .storage
            .put_object(&key, Bytes::from(bytes), content_type_for_ext(ext))
            .await;
        remove_local_files(std::slice::from_ref(&local_path.to_string())).await;

        match result {
            Ok(()) => {
                debug!(key = %key, "asset uploaded");
                Some(MediaAsset {
                    url: format!("{}/{}/{}", self.endpoint, self.bucket, key),
                    asset_id: key,
                })
            }
            Err(e) => {
                warn!(key = %key, error = %e, "asset upload failed");
                None
            }
        }
    }

    /// Remove a previously uploaded asset. False on failure.
    pub async fn delete(&self, asset_id: &str) -> bool {
        match self.storage.delete_object(asset_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(asset_id = %asset_id, error = %e, "asset delete failed");
                false
            }
        }
    }
}

/// Best-effort removal of spool files, used on early validation exits.
/// Empty entries mean "no file was received for this slot".
pub async fn remove_local_files(paths: &[String]) {
    for path in paths {
        if path.is_empty() {
            continue;
        }
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path, error = %e, "failed to remove spooled file");
        }
    }
}

/// Write one multipart file field into the spool directory, keeping the
/// client's file extension. Returns the spool path.
pub async fn spool_upload(
    upload_dir: &str,
    file_name: Option<&str>,
    data: Bytes,
) -> anyhow::Result<String> {
    tokio::fs::create_dir_all(upload_dir)
        .await
        .context("create upload dir")?;
    let ext = file_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let path = format!(
        "{}/{}.{}",
        upload_dir.trim_end_matches('/'),
        Uuid::new_v4(),
        ext
    );
    tokio::fs::write(&path, &data)
        .await
        .context("write spooled upload")?;
    Ok(path)
}

fn content_type_for_ext(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct OkStorage {
        puts: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl OkStorage {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                puts: AtomicUsize::new(0),
                deletes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl StorageClient for OkStorage {
        async fn put_object(&self, _k: &str, _b: Bytes, _ct: &str) -> anyhow::Result<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn delete_object(&self, _k: &str) -> anyhow::Result<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingStorage;

    #[async_trait]
    impl StorageClient for FailingStorage {
        async fn put_object(&self, _k: &str, _b: Bytes, _ct: &str) -> anyhow::Result<()> {
            anyhow::bail!("bucket unreachable")
        }
        async fn delete_object(&self, _k: &str) -> anyhow::Result<()> {
            anyhow::bail!("bucket unreachable")
        }
    }

    fn gateway(storage: Arc<dyn StorageClient>) -> MediaGateway {
        let cfg = MediaConfig {
            endpoint: "http://assets.local:9000/".into(),
            bucket: "media".into(),
            access_key: "k".into(),
            secret_key: "s".into(),
            region: "us-east-1".into(),
            key_prefix: "cliptube".into(),
            upload_dir: "unused".into(),
        };
        MediaGateway::new(&cfg, storage)
    }

    async fn spooled_file(dir: &tempfile::TempDir, name: &str) -> String {
        let path = dir.path().join(name).to_string_lossy().into_owned();
        tokio::fs::write(&path, b"fake image bytes").await.unwrap();
        path
    }

    #[tokio::test]
    async fn upload_empty_path_is_none() {
        let gw = gateway(OkStorage::new());
        assert!(gw.upload("").await.is_none());
    }

    #[tokio::test]
    async fn upload_success_removes_spool_file_and_returns_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = spooled_file(&dir, "avatar.png").await;

        let storage = OkStorage::new();
        let gw = gateway(storage.clone());
        let asset = gw.upload(&path).await.expect("upload should succeed");

        assert!(asset.asset_id.starts_with("cliptube/"));
        assert!(asset.asset_id.ends_with(".png"));
        assert_eq!(
            asset.url,
            format!("http://assets.local:9000/media/{}", asset.asset_id)
        );
        assert_eq!(storage.puts.load(Ordering::SeqCst), 1);
        assert!(!Path::new(&path).exists(), "spool file must be removed");
    }

    #[tokio::test]
    async fn upload_failure_still_removes_spool_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = spooled_file(&dir, "avatar.jpg").await;

        let gw = gateway(Arc::new(FailingStorage));
        assert!(gw.upload(&path).await.is_none());
        assert!(!Path::new(&path).exists(), "spool file must be removed");
    }

    #[tokio::test]
    async fn upload_unreadable_path_is_none() {
        let gw = gateway(OkStorage::new());
        assert!(gw.upload("/nonexistent/nowhere.png").await.is_none());
    }

    #[tokio::test]
    async fn delete_reports_failure_as_false() {
        let ok = gateway(OkStorage::new());
        assert!(ok.delete("cliptube/a.png").await);

        let failing = gateway(Arc::new(FailingStorage));
        assert!(!failing.delete("cliptube/a.png").await);
    }

    #[tokio::test]
    async fn remove_local_files_skips_empty_slots() {
        let dir = tempfile::tempdir().unwrap();
        let path = spooled_file(&dir, "cover.webp").await;

        remove_local_files(&[String::new(), path.clone()]).await;
        assert!(!Path::new(&path).exists());
    }

    #[tokio::test]
    async fn spool_upload_keeps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let spool_dir = dir.path().to_string_lossy().into_owned();

        let path = spool_upload(&spool_dir, Some("me.jpeg"), Bytes::from_static(b"x"))
            .await
            .unwrap();
        assert!(path.ends_with(".jpeg"));
        assert!(Path::new(&path).exists());

        let fallback = spool_upload(&spool_dir, None, Bytes::from_static(b"x"))
            .await
            .unwrap();
        assert!(fallback.ends_with(".bin"));
    }

    #[test]
    fn content_types_cover_common_images() {
        assert_eq!(content_type_for_ext("jpg"), "image/jpeg");
        assert_eq!(content_type_for_ext("jpeg"), "image/jpeg");
        assert_eq!(content_type_for_ext("png"), "image/png");
        assert_eq!(content_type_for_ext("webp"), "image/webp");
        assert_eq!(content_type_for_ext("bin"), "application/octet-stream");
    }
}
