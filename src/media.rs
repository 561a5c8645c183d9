//! On-disk media cache for downloaded images and snapshot screenshots.
//!
//! Cache entries are keyed by stable identifiers: the sha256 of a remote URL,
//! or the attachment key plus file name for screenshots. A non-empty file at
//! the cache path is a hit and is never regenerated.

use crate::config::ExportConfig;
use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
#[cfg(feature = "remote")]
use std::time::Duration;

/// Screenshot viewport, in pixels.
const SNAPSHOT_SIZE: u32 = 1024;

/// Fetches the bytes behind a URL.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Renders a saved HTML page into a PNG image.
pub trait SnapshotRenderer {
    fn render(&self, html: &Path, output: &Path) -> Result<()>;
}

/// Blocking HTTP fetcher with a request timeout.
#[cfg(feature = "remote")]
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote")]
impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("unzotero/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[cfg(feature = "remote")]
impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

/// Fetcher used when the crate is built without network support.
#[derive(Debug, Default)]
pub struct OfflineFetcher;

impl Fetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Err(Error::Http(format!("network support disabled, cannot fetch {}", url)))
    }
}

/// Runs an external `wkhtmltoimage`-compatible command.
#[derive(Debug, Clone)]
pub struct CommandSnapshotRenderer {
    program: String,
}

impl CommandSnapshotRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SnapshotRenderer for CommandSnapshotRenderer {
    fn render(&self, html: &Path, output: &Path) -> Result<()> {
        let size = SNAPSHOT_SIZE.to_string();
        let result = Command::new(&self.program)
            .args(["--quiet", "--format", "png", "--width", &size, "--height", &size])
            .arg(html)
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::Snapshot(format!("cannot run {}: {}", self.program, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::Snapshot(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Cache of media files produced during an export.
pub struct MediaCache {
    dir: PathBuf,
    fetcher: Box<dyn Fetcher>,
    snapshots: Box<dyn SnapshotRenderer>,
}

impl MediaCache {
    /// Creates a cache in `config.cache_dir` with the default fetcher and
    /// screenshot command.
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            dir: config.cache_dir.clone(),
            fetcher: default_fetcher(config),
            snapshots: Box::new(CommandSnapshotRenderer::new(&config.snapshot_command)),
        }
    }

    /// Creates a cache in `dir` with explicit collaborators.
    pub fn with_parts(
        dir: impl Into<PathBuf>,
        fetcher: Box<dyn Fetcher>,
        snapshots: Box<dyn SnapshotRenderer>,
    ) -> Self {
        Self {
            dir: dir.into(),
            fetcher,
            snapshots,
        }
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a remote image is cached under.
    pub fn remote_image_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        let ext = url_extension(url).unwrap_or_else(|| "img".to_string());
        self.dir
            .join("images")
            .join(format!("{}.{}", hex::encode(digest), ext))
    }

    /// Path a snapshot screenshot is cached under.
    pub fn snapshot_path(&self, key: &str, html: &Path) -> PathBuf {
        let name = html
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = sanitize(&format!("{}_{}", key, name));
        self.dir.join("snapshots").join(format!("{}.png", name))
    }

    /// Returns a local copy of a remote image, downloading it on a miss.
    pub fn remote_image(&self, url: &str) -> Result<PathBuf> {
        let path = self.remote_image_path(url);
        if is_cached(&path) {
            log::debug!("image cache hit: {}", url);
            return Ok(path);
        }

        log::debug!("downloading image: {}", url);
        let bytes = self.fetcher.fetch(url)?;
        image::guess_format(&bytes)
            .map_err(|e| Error::ImageDecode(format!("{} is not an image: {}", url, e)))?;
        write_entry(&path, &bytes)?;
        Ok(path)
    }

    /// Returns a screenshot of a saved HTML page, rendering it on a miss.
    pub fn snapshot(&self, key: &str, html: &Path) -> Result<PathBuf> {
        if !html.is_file() {
            return Err(Error::ResourceNotFound(html.display().to_string()));
        }
        let path = self.snapshot_path(key, html);
        if is_cached(&path) {
            log::debug!("snapshot cache hit: {}", path.display());
            return Ok(path);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        log::debug!("rendering snapshot: {}", html.display());
        self.snapshots.render(html, &path)?;
        if !is_cached(&path) {
            return Err(Error::Snapshot(format!(
                "screenshot missing or empty after rendering {}",
                html.display()
            )));
        }
        Ok(path)
    }
}

#[cfg(feature = "remote")]
fn default_fetcher(config: &ExportConfig) -> Box<dyn Fetcher> {
    match HttpFetcher::new(Duration::from_secs(config.download_timeout_secs)) {
        Ok(fetcher) => Box::new(fetcher),
        Err(e) => {
            log::warn!("HTTP client unavailable, remote images disabled: {}", e);
            Box::new(OfflineFetcher)
        }
    }
}

#[cfg(not(feature = "remote"))]
fn default_fetcher(_config: &ExportConfig) -> Box<dyn Fetcher> {
    Box::new(OfflineFetcher)
}

fn is_cached(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

fn write_entry(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let (_, ext) = path.rsplit('/').next()?.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    (!ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use std::cell::Cell;
    use std::rc::Rc;

    fn png_bytes() -> Vec<u8> {
        STANDARD.decode(crate::html::img::tests::PNG_1X1).unwrap()
    }

    struct CountingFetcher {
        calls: Rc<Cell<usize>>,
        body: Vec<u8>,
    }

    impl Fetcher for CountingFetcher {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.body.clone())
        }
    }

    struct CopySnapshots {
        calls: Rc<Cell<usize>>,
    }

    impl SnapshotRenderer for CopySnapshots {
        fn render(&self, _html: &Path, output: &Path) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            fs::write(output, png_bytes())?;
            Ok(())
        }
    }

    struct FailingSnapshots;

    impl SnapshotRenderer for FailingSnapshots {
        fn render(&self, _html: &Path, _output: &Path) -> Result<()> {
            Err(Error::Snapshot("renderer not installed".into()))
        }
    }

    fn cache(dir: &Path, body: Vec<u8>) -> (MediaCache, Rc<Cell<usize>>, Rc<Cell<usize>>) {
        let fetches = Rc::new(Cell::new(0));
        let renders = Rc::new(Cell::new(0));
        let cache = MediaCache::with_parts(
            dir,
            Box::new(CountingFetcher {
                calls: fetches.clone(),
                body,
            }),
            Box::new(CopySnapshots {
                calls: renders.clone(),
            }),
        );
        (cache, fetches, renders)
    }

    #[test]
    fn test_remote_image_downloads_once() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, fetches, _) = cache(dir.path(), png_bytes());

        let first = cache.remote_image("https://example.org/fig.png").unwrap();
        let second = cache.remote_image("https://example.org/fig.png").unwrap();
        assert_eq!(first, second);
        assert_eq!(fetches.get(), 1);
        assert!(first.to_string_lossy().ends_with(".png"));

        let stem = first.file_stem().unwrap().to_string_lossy().to_string();
        assert_eq!(stem.len(), 64);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_remote_image_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, _, _) = cache(dir.path(), b"<html>not found</html>".to_vec());

        let result = cache.remote_image("https://example.org/fig.png");
        assert!(matches!(result, Err(Error::ImageDecode(_))));
        assert!(!cache.remote_image_path("https://example.org/fig.png").exists());
    }

    #[test]
    fn test_empty_cache_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, fetches, _) = cache(dir.path(), png_bytes());
        let url = "https://example.org/a.gif";

        write_entry(&cache.remote_image_path(url), b"").unwrap();
        cache.remote_image(url).unwrap();
        assert_eq!(fetches.get(), 1);
    }

    #[test]
    fn test_snapshot_rendered_once() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("page.html");
        fs::write(&html, "<html></html>").unwrap();
        let (cache, _, renders) = cache(&dir.path().join("cache"), Vec::new());

        let first = cache.snapshot("KEY1", &html).unwrap();
        let second = cache.snapshot("KEY1", &html).unwrap();
        assert_eq!(first, second);
        assert_eq!(renders.get(), 1);
        assert_eq!(first.file_name().unwrap(), "KEY1_page.html.png");
    }

    #[test]
    fn test_snapshot_failures() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("page.html");
        fs::write(&html, "<html></html>").unwrap();
        let cache = MediaCache::with_parts(
            dir.path().join("cache"),
            Box::new(OfflineFetcher),
            Box::new(FailingSnapshots),
        );

        assert!(matches!(cache.snapshot("K", &html), Err(Error::Snapshot(_))));
        assert!(matches!(
            cache.snapshot("K", &dir.path().join("missing.html")),
            Err(Error::ResourceNotFound(_))
        ));
        assert!(matches!(
            cache.remote_image("https://example.org/x.png"),
            Err(Error::Http(_))
        ));
    }

    #[test]
    fn test_url_extension() {
        assert_eq!(url_extension("https://a.org/x.PNG?s=1").as_deref(), Some("png"));
        assert_eq!(url_extension("https://a.org/x"), None);
        assert_eq!(sanitize("a b/c:d.png"), "a_b_c_d.png");
    }
}
