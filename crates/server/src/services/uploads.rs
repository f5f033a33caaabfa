//! Local image storage.
//!
//! Uploaded images are written to the configured upload directory under a
//! random file name and served from [`UPLOAD_URL_PREFIX`].

use std::io::ErrorKind;
use std::path::Path;

use thiserror::Error;
use uuid::Uuid;

/// Public URL prefix of stored uploads.
pub const UPLOAD_URL_PREFIX: &str = "/static/images/";

/// Errors from storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file is not an image.
    #[error("File must be an image")]
    NotAnImage,

    /// The file is empty.
    #[error("File is empty")]
    Empty,

    /// Writing to disk failed.
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Store an image and return its public URL.
///
/// # Errors
///
/// `UploadError::NotAnImage` unless `content_type` is `image/*`,
/// `UploadError::Empty` for an empty body, `UploadError::Io` on write failure.
pub async fn save_image(
    upload_dir: &Path,
    content_type: Option<&str>,
    original_name: Option<&str>,
    bytes: &[u8],
) -> Result<String, UploadError> {
    let content_type = content_type.unwrap_or_default();
    if !content_type.starts_with("image/") {
        return Err(UploadError::NotAnImage);
    }
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }

    let file_name = format!(
        "{}.{}",
        Uuid::new_v4().simple(),
        extension(original_name, content_type)
    );

    tokio::fs::create_dir_all(upload_dir).await?;
    tokio::fs::write(upload_dir.join(&file_name), bytes).await?;

    tracing::info!(file = %file_name, size = bytes.len(), "Image uploaded");
    Ok(format!("{UPLOAD_URL_PREFIX}{file_name}"))
}

/// Delete a previously stored image, given its public URL.
///
/// URLs that point elsewhere (external hosts, other directories) are left
/// alone. A file that is already gone is not an error.
pub async fn remove_local_image(upload_dir: &Path, url: &str) {
    let Some(file_name) = local_file_name(url) else {
        return;
    };

    match tokio::fs::remove_file(upload_dir.join(file_name)).await {
        Ok(()) => tracing::info!(file = %file_name, "Removed image"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(file = %file_name, error = %e, "Failed to remove image"),
    }
}

fn local_file_name(url: &str) -> Option<&str> {
    url.strip_prefix(UPLOAD_URL_PREFIX).filter(|name| {
        !name.is_empty() && !name.contains(['/', '\\']) && !name.starts_with('.')
    })
}

fn extension(original_name: Option<&str>, content_type: &str) -> String {
    let from_name = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    if let Some(ext) = from_name {
        return ext.to_ascii_lowercase();
    }

    match content_type.trim_start_matches("image/") {
        "jpeg" | "pjpeg" => "jpg".to_owned(),
        "svg+xml" => "svg".to_owned(),
        other if !other.is_empty() && other.chars().all(|c| c.is_ascii_alphanumeric()) => {
            other.to_owned()
        }
        _ => "bin".to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_prefers_file_name() {
        assert_eq!(extension(Some("Photo.PNG"), "image/jpeg"), "png");
        assert_eq!(extension(Some("noext"), "image/jpeg"), "jpg");
        assert_eq!(extension(None, "image/webp"), "webp");
        assert_eq!(extension(None, "image/svg+xml"), "svg");
        assert_eq!(extension(Some("x.toolongext"), "image/gif"), "gif");
    }

    #[test]
    fn test_local_file_name_rejects_foreign_urls() {
        assert_eq!(local_file_name("/static/images/abc.jpg"), Some("abc.jpg"));
        assert_eq!(local_file_name("https://cdn.example.com/abc.jpg"), None);
        assert_eq!(local_file_name("/static/images/../secret"), None);
        assert_eq!(local_file_name("/static/images/"), None);
    }

    #[tokio::test]
    async fn test_save_and_remove_image() {
        let dir = std::env::temp_dir().join(format!("schoolmall-upload-{}", Uuid::new_v4()));

        let url = save_image(&dir, Some("image/png"), Some("logo.png"), b"\x89PNG")
            .await
            .unwrap();
        assert!(url.starts_with(UPLOAD_URL_PREFIX));
        assert!(url.ends_with(".png"));

        let path = dir.join(local_file_name(&url).unwrap());
        assert!(path.exists());

        remove_local_image(&dir, &url).await;
        assert!(!path.exists());

        // Second removal is a no-op.
        remove_local_image(&dir, &url).await;
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_save_rejects_non_images() {
        let dir = std::env::temp_dir();
        assert!(matches!(
            save_image(&dir, Some("application/pdf"), Some("a.pdf"), b"%PDF").await,
            Err(UploadError::NotAnImage)
        ));
        assert!(matches!(
            save_image(&dir, None, None, b"data").await,
            Err(UploadError::NotAnImage)
        ));
        assert!(matches!(
            save_image(&dir, Some("image/png"), None, b"").await,
            Err(UploadError::Empty)
        ));
    }
}
