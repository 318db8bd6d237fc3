//! Media upload storage.

use std::path::{Path, PathBuf};

use rand::Rng;
use rand::distr::Alphanumeric;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Accepted MIME types and the extension files are stored under.
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("image/svg+xml", ".svg"),
    ("image/avif", ".avif"),
];

/// Extension for an accepted MIME type, `None` if the type is not allowed.
pub fn extension_for(mime: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == mime)
        .map(|(_, ext)| *ext)
}

/// Content type to serve a stored file with, by extension.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

/// `<unix millis>-<6 random chars><ext>`.
pub fn generate_filename(ext: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}-{suffix}{ext}", chrono::Utc::now().timestamp_millis())
}

/// Resolve a requested path under the upload directory.
///
/// `None` for traversal attempts (`..`) and absolute paths.
pub fn resolve_served_path(upload_dir: &Path, requested: &str) -> Option<PathBuf> {
    if requested.contains("..") || requested.starts_with('/') || requested.starts_with('\\') {
        return None;
    }
    Some(upload_dir.join(requested))
}

/// Write an upload to disk, creating the directory if needed.
pub async fn store_upload(upload_dir: &Path, filename: &str, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(upload_dir).await?;
    tokio::fs::write(upload_dir.join(filename), bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_images_are_allowed() {
        assert_eq!(extension_for("image/png"), Some(".png"));
        assert_eq!(extension_for("image/svg+xml"), Some(".svg"));
        assert_eq!(extension_for("text/html"), None);
        assert_eq!(extension_for("application/pdf"), None);
    }

    #[test]
    fn content_type_by_extension() {
        assert_eq!(content_type_for("a/b/photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("x.avif"), "image/avif");
        assert_eq!(content_type_for("notes.txt"), "application/octet-stream");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn traversal_is_rejected() {
        let dir = Path::new("/srv/uploads");
        assert!(resolve_served_path(dir, "../etc/passwd").is_none());
        assert!(resolve_served_path(dir, "a/../../b").is_none());
        assert!(resolve_served_path(dir, "/etc/passwd").is_none());
        assert_eq!(
            resolve_served_path(dir, "2026/a.png"),
            Some(PathBuf::from("/srv/uploads/2026/a.png"))
        );
    }

    #[test]
    fn filenames_are_unique_with_extension() {
        let a = generate_filename(".png");
        let b = generate_filename(".png");
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
    }
}
