//! Attachment path resolution.
//!
//! Imported attachments live at `<storage>/<attachment key>/<filename>`.
//! Linked files carry a `path` that is either `storage:<relative>` or an
//! absolute filesystem path.

use crate::model::Attachment;
use std::path::{Path, PathBuf};

/// File extensions treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

const STORAGE_PREFIX: &str = "storage:";

/// Returns true if the path has an image extension (case-insensitive).
pub fn is_image_file(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

/// Returns true if the path is a saved HTML page.
pub fn is_html_file(path: &Path) -> bool {
    has_extension(path, &["html", "htm"])
}

/// Returns true if the URL path ends in an image extension. Query strings
/// and fragments are ignored.
pub fn is_image_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => IMAGE_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext)),
        _ => false,
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Resolves the local file for an attachment, or `None` when nothing exists
/// on disk. Every miss is logged.
pub fn resolve_attachment_path(storage_dir: &Path, attachment: &Attachment) -> Option<PathBuf> {
    if !storage_dir.is_dir() {
        log::warn!("storage directory does not exist: {}", storage_dir.display());
        return None;
    }

    if attachment.link_mode.is_imported() && !attachment.key.is_empty() {
        if let Some(path) = resolve_imported(storage_dir, attachment) {
            return Some(path);
        }
    }

    let raw = attachment.path.as_deref()?;
    if let Some(relative) = raw.strip_prefix(STORAGE_PREFIX) {
        let path = storage_dir.join(relative);
        if path.exists() {
            return Some(path);
        }
        log::warn!("linked storage path does not exist: {}", path.display());
    } else if Path::new(raw).is_absolute() {
        let path = PathBuf::from(raw);
        if path.exists() {
            return Some(path);
        }
        log::warn!("linked file does not exist: {}", path.display());
    } else {
        log::warn!("cannot resolve attachment path: {}", raw);
    }
    None
}

fn resolve_imported(storage_dir: &Path, attachment: &Attachment) -> Option<PathBuf> {
    let folder = storage_dir.join(&attachment.key);

    if !attachment.filename.is_empty() {
        let path = folder.join(&attachment.filename);
        if path.exists() {
            return Some(path);
        }
        log::warn!("attachment file does not exist: {}", path.display());
    }

    // Fall back to the first file in the attachment folder
    let entries = match std::fs::read_dir(&folder) {
        Ok(entries) => entries,
        Err(_) => {
            log::warn!("attachment folder does not exist: {}", folder.display());
            return None;
        }
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let first = files.into_iter().next();
    if first.is_none() {
        log::warn!("no files in attachment folder: {}", folder.display());
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinkMode;
    use std::fs;

    fn imported(key: &str, filename: &str) -> Attachment {
        Attachment {
            key: key.to_string(),
            filename: filename.to_string(),
            link_mode: LinkMode::ImportedFile,
            url: None,
            path: None,
            content_type: None,
        }
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a/b/fig.PNG")));
        assert!(is_image_file(Path::new("x.jpeg")));
        assert!(!is_image_file(Path::new("paper.pdf")));
        assert!(!is_image_file(Path::new("png")));
        assert!(is_html_file(Path::new("snap.html")));
    }

    #[test]
    fn test_is_image_url() {
        assert!(is_image_url("https://example.org/a/fig.png"));
        assert!(is_image_url("https://example.org/fig.JPG?size=large#top"));
        assert!(!is_image_url("https://example.org/page.html"));
        assert!(!is_image_url("https://example.org/"));
        assert!(!is_image_url("https://example.org/.png"));
    }

    #[test]
    fn test_resolve_imported_file() {
        let storage = tempfile::tempdir().unwrap();
        fs::create_dir(storage.path().join("K1")).unwrap();
        fs::write(storage.path().join("K1").join("fig.png"), b"x").unwrap();

        let path = resolve_attachment_path(storage.path(), &imported("K1", "fig.png"));
        assert_eq!(path, Some(storage.path().join("K1").join("fig.png")));
    }

    #[test]
    fn test_resolve_falls_back_to_first_file() {
        let storage = tempfile::tempdir().unwrap();
        let folder = storage.path().join("K2");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("b.html"), b"x").unwrap();
        fs::write(folder.join("a.html"), b"x").unwrap();

        let path = resolve_attachment_path(storage.path(), &imported("K2", "missing.html"));
        assert_eq!(path, Some(folder.join("a.html")));

        let path = resolve_attachment_path(storage.path(), &imported("K2", ""));
        assert_eq!(path, Some(folder.join("a.html")));
    }

    #[test]
    fn test_resolve_linked_paths() {
        let storage = tempfile::tempdir().unwrap();
        fs::write(storage.path().join("linked.png"), b"x").unwrap();

        let mut att = imported("", "");
        att.link_mode = LinkMode::LinkedFile;
        att.path = Some("storage:linked.png".to_string());
        assert_eq!(
            resolve_attachment_path(storage.path(), &att),
            Some(storage.path().join("linked.png"))
        );

        let absolute = storage.path().join("linked.png");
        att.path = Some(absolute.to_string_lossy().into_owned());
        assert_eq!(resolve_attachment_path(storage.path(), &att), Some(absolute));

        att.path = Some("relative/nowhere.png".to_string());
        assert_eq!(resolve_attachment_path(storage.path(), &att), None);
    }

    #[test]
    fn test_resolve_missing() {
        let storage = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_attachment_path(storage.path(), &imported("NOPE", "x.png")),
            None
        );
        assert_eq!(
            resolve_attachment_path(Path::new("/no/such/storage"), &imported("K", "x.png")),
            None
        );
    }
}
