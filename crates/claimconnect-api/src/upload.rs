use std::path::{Path, PathBuf};

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::multipart::Field;
use chrono::Utc;
use tracing::info;

use crate::error::ApiError;

/// Cap on any single uploaded file.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// MIME types accepted for item photos.
pub const ITEM_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg"];

/// MIME types accepted for verification invoices.
pub const INVOICE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "application/pdf"];

pub const ITEM_IMAGE_TYPE_ERROR: &str = "Only JPEG images are allowed!";
pub const INVOICE_TYPE_ERROR: &str = "Only JPEG, PNG, or PDF documents are allowed!";

/// A fully-read multipart file: validated, but not yet on disk.
pub struct PendingUpload {
    pub original_name: String,
    pub data: Bytes,
}

/// Read one multipart file field, enforcing the MIME allow-list and size cap
/// before anything touches disk or the database.
pub async fn read_upload(
    field: Field<'_>,
    allowed: &[&str],
    type_error: &str,
) -> Result<PendingUpload, ApiError> {
    let content_type = field.content_type().unwrap_or_default().to_ascii_lowercase();
    if !allowed.contains(&content_type.as_str()) {
        return Err(ApiError::validation(type_error));
    }

    let original_name = field.file_name().unwrap_or("upload").to_string();
    let data = field
        .bytes()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart payload"))?;

    if data.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::PayloadTooLarge);
    }

    Ok(PendingUpload {
        original_name,
        data,
    })
}

/// On-disk store for uploaded photos and documents.
///
/// Files land in a single flat directory as `{unix_millis}-{original_name}`;
/// only the public `/uploads/...` path string is recorded on the owning row.
/// Name collisions within one millisecond are accepted, and nothing cleans
/// up files whose owning record insert later fails.
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a validated upload and return the public path for the record.
    pub async fn store(&self, upload: &PendingUpload) -> Result<String> {
        let stored_name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_filename(&upload.original_name)
        );
        tokio::fs::write(self.dir.join(&stored_name), &upload.data).await?;
        Ok(format!("/uploads/{}", stored_name))
    }
}

/// Reduce a client-supplied filename to its final component so a crafted
/// name cannot escape the upload directory.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    if base.is_empty() || base == "." || base == ".." {
        "upload".to_string()
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_image_allow_list() {
        assert!(ITEM_IMAGE_TYPES.contains(&"image/jpeg"));
        assert!(ITEM_IMAGE_TYPES.contains(&"image/jpg"));
        assert!(!ITEM_IMAGE_TYPES.contains(&"text/plain"));
        assert!(!ITEM_IMAGE_TYPES.contains(&"image/png"));
    }

    #[test]
    fn test_invoice_allow_list_extends_images() {
        assert!(INVOICE_TYPES.contains(&"image/png"));
        assert!(INVOICE_TYPES.contains(&"application/pdf"));
        assert!(!INVOICE_TYPES.contains(&"text/plain"));
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("a/b/c.jpg"), "c.jpg");
        assert_eq!(sanitize_filename("..\\..\\evil.jpg"), "evil.jpg");
    }

    #[test]
    fn test_sanitize_rejects_empty_and_dots() {
        assert_eq!(sanitize_filename(""), "upload");
        assert_eq!(sanitize_filename(".."), "upload");
        assert_eq!(sanitize_filename("dir/"), "upload");
    }

    #[tokio::test]
    async fn test_store_writes_under_dir_and_returns_public_path() {
        let tmp = tempfile::tempdir().unwrap();
        let store = UploadStore::new(tmp.path().to_path_buf()).await.unwrap();

        let upload = PendingUpload {
            original_name: "../sneaky/receipt.jpg".to_string(),
            data: Bytes::from_static(b"\xff\xd8\xff\xe0fake-jpeg"),
        };
        let public = store.store(&upload).await.unwrap();

        assert!(public.starts_with("/uploads/"));
        assert!(public.ends_with("-receipt.jpg"));

        let stored_name = public.strip_prefix("/uploads/").unwrap();
        let on_disk = tmp.path().join(stored_name);
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"\xff\xd8\xff\xe0fake-jpeg");
    }
}
